//! Единая система управления пользователями.
//!
//! Обеспечивает единый стабильный ID для каждого пользователя во всех
//! подсистемах (игровые комнаты, чат, статистика): ID детерминированно
//! выводится из email, поэтому повторная регистрация и переподключение
//! всегда приводят к одной и той же записи. Дополнительно отслеживает
//! активные соединения для вычисления присутствия (online/offline).

pub mod registry;
pub mod user;

pub use self::registry::{IdentityError, UserRegistry};
pub use self::user::{RegistryStats, UserIdentity, UserSummary, UserUpdate};
