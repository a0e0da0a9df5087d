use chrono::{Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::user::{RegistryStats, UserIdentity, UserSummary, UserUpdate};

/// Simple `local@domain` shape check; deeper validation belongs to the
/// account/session layer that hands us the email.
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Identity registry errors
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Email is required for id derivation and registration
    #[error("email is required")]
    EmptyEmail,

    /// Email does not match the `local@domain` shape
    #[error("invalid email format: {0}")]
    InvalidEmail(String),
}

/// Реестр пользователей: единственный источник истины для соответствия
/// email → внутренний ID, плюс учет активных соединений.
///
/// Создается один раз при старте процесса и передается по ссылке всем
/// потребителям (комнаты, чат, статистика). Все методы принимают `&self`
/// и безопасны при конкурентных вызовах: записи хранятся в [`DashMap`],
/// изменение множества соединений происходит на месте под шардовой
/// блокировкой, без read-modify-write на копии.
pub struct UserRegistry {
    users: DashMap<String, UserIdentity>,
}

impl Default for UserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UserRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
        }
    }

    /// Derives the stable user id from an email.
    ///
    /// The email is normalized (lower-cased, trimmed) and run through a
    /// 32-bit rolling hash (`acc = acc * 31 + char`, wrapping), rendered as
    /// `user_<base36>`. Pure function of the input: no randomness, no
    /// counters, stable across process restarts.
    ///
    /// # Errors
    ///
    /// [`IdentityError::EmptyEmail`] when the email is empty or whitespace.
    ///
    /// # Example
    ///
    /// ```
    /// use kubyshka_core::users::UserRegistry;
    ///
    /// let registry = UserRegistry::new();
    /// let a = registry.generate_user_id("Alice@Example.com").unwrap();
    /// let b = registry.generate_user_id("  alice@example.com ").unwrap();
    /// assert_eq!(a, b);
    /// ```
    pub fn generate_user_id(&self, email: &str) -> Result<String, IdentityError> {
        let normalized = email.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(IdentityError::EmptyEmail);
        }
        Ok(format!("user_{}", to_base36(simple_hash(&normalized))))
    }

    /// Регистрирует пользователя с единым ID.
    ///
    /// Идемпотентна: если для этого email уже существует запись, она
    /// возвращается без изменений (имена не перезаписываются, `last_seen`
    /// не обновляется). Проверка и создание выполняются атомарно через
    /// entry API, поэтому две одновременные регистрации одного email не
    /// создадут дубликат.
    ///
    /// # Arguments
    ///
    /// * `email` - Email пользователя (обязателен, проверяется по форме `local@domain`)
    /// * `username` - Имя пользователя; по умолчанию локальная часть email
    /// * `first_name` - Имя; по умолчанию `username`
    /// * `last_name` - Фамилия; по умолчанию пустая строка
    pub fn register(
        &self,
        email: &str,
        username: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<UserIdentity, IdentityError> {
        let normalized = email.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(IdentityError::EmptyEmail);
        }
        if !EMAIL_RE.is_match(&normalized) {
            return Err(IdentityError::InvalidEmail(normalized));
        }

        let id = format!("user_{}", to_base36(simple_hash(&normalized)));

        match self.users.entry(id.clone()) {
            Entry::Occupied(existing) => {
                let user = existing.get();
                log::debug!(
                    "Пользователь уже зарегистрирован: {} ({}) id={}",
                    user.username,
                    user.email,
                    user.id
                );
                Ok(user.clone())
            }
            Entry::Vacant(slot) => {
                let local_part = normalized
                    .split('@')
                    .next()
                    .unwrap_or(normalized.as_str())
                    .to_string();
                let username = username
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| local_part.clone());
                let first_name = first_name
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| username.clone());
                let last_name = last_name.unwrap_or_default().to_string();

                let now = Utc::now();
                let user = UserIdentity {
                    id: id.clone(),
                    email: normalized,
                    username,
                    first_name,
                    last_name,
                    registered_at: now,
                    last_seen: now,
                    connections: Default::default(),
                    is_online: false,
                };
                log::info!(
                    "Новый пользователь зарегистрирован: {} ({}) id={}",
                    user.username,
                    user.email,
                    id
                );
                Ok(slot.insert(user).clone())
            }
        }
    }

    /// Returns the identity for an id, or `None` if it was never registered.
    pub fn get_by_id(&self, id: &str) -> Option<UserIdentity> {
        self.users.get(id).map(|user| user.value().clone())
    }

    /// Returns the identity for an email by re-deriving its id.
    pub fn get_by_email(&self, email: &str) -> Result<Option<UserIdentity>, IdentityError> {
        let id = self.generate_user_id(email)?;
        Ok(self.get_by_id(&id))
    }

    /// Merges the given fields into a stored identity and refreshes
    /// `last_seen`. Returns `false` (no-op, not an error) when the id is
    /// unknown.
    pub fn update(&self, id: &str, update: UserUpdate) -> bool {
        match self.users.get_mut(id) {
            Some(mut user) => {
                if let Some(username) = update.username {
                    user.username = username;
                }
                if let Some(first_name) = update.first_name {
                    user.first_name = first_name;
                }
                if let Some(last_name) = update.last_name {
                    user.last_name = last_name;
                }
                user.last_seen = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Adds a connection handle to a user and recomputes presence.
    ///
    /// The mutation happens in place under the map's shard lock, so
    /// concurrent connects/disconnects for the same identity never lose
    /// updates. Unknown ids are a no-op (connections never auto-create
    /// identities). Returns whether the identity was found.
    pub fn add_connection(&self, id: &str, connection_id: &str) -> bool {
        match self.users.get_mut(id) {
            Some(mut user) => {
                user.connections.insert(connection_id.to_string());
                user.is_online = !user.connections.is_empty();
                user.last_seen = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Removes a connection handle from a user and recomputes presence.
    /// Unknown ids are a no-op. Returns whether the identity was found.
    pub fn remove_connection(&self, id: &str, connection_id: &str) -> bool {
        match self.users.get_mut(id) {
            Some(mut user) => {
                user.connections.remove(connection_id);
                user.is_online = !user.connections.is_empty();
                user.last_seen = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Returns all users that currently have at least one connection.
    pub fn online_users(&self) -> Vec<UserIdentity> {
        self.users
            .iter()
            .filter(|user| user.is_online)
            .map(|user| user.value().clone())
            .collect()
    }

    /// Total number of registered users.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Number of users currently online.
    pub fn online_user_count(&self) -> usize {
        self.users.iter().filter(|user| user.is_online).count()
    }

    /// Удаляет неактивных пользователей.
    ///
    /// Неактивный — офлайн и не появлялся дольше `max_inactive_hours`.
    /// Пользователи с активными соединениями не удаляются никогда,
    /// независимо от возраста записи. Возвращает число удаленных.
    pub fn cleanup_inactive(&self, max_inactive_hours: i64) -> usize {
        let cutoff = Utc::now() - Duration::hours(max_inactive_hours);
        let before = self.users.len();
        self.users
            .retain(|_, user| user.is_online || user.last_seen >= cutoff);
        let removed = before - self.users.len();
        if removed > 0 {
            log::info!("Удалено {} неактивных пользователей", removed);
        }
        removed
    }

    /// Aggregate statistics: totals plus up to 10 online users ordered by
    /// most recent `last_seen`.
    pub fn stats(&self) -> RegistryStats {
        let total = self.users.len();
        let mut online = self.online_users();
        online.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));

        let top_users = online
            .iter()
            .take(10)
            .map(|user| UserSummary {
                id: user.id.clone(),
                username: user.username.clone(),
                email: user.email.clone(),
                last_seen: user.last_seen,
                connections: user.connections.len(),
            })
            .collect();

        RegistryStats {
            total,
            online: online.len(),
            offline: total - online.len(),
            top_users,
        }
    }
}

/// Rolling 32-bit hash over the string's characters, matching the historical
/// id scheme: `acc = acc * 31 + char` in wrapping i32 arithmetic. Ids minted
/// by earlier deployments must keep resolving to the same records, so the
/// algorithm is load-bearing, not a style choice.
fn simple_hash(s: &str) -> u32 {
    let mut hash: i32 = 0;
    for c in s.chars() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(c as i32);
    }
    hash.unsigned_abs()
}

fn to_base36(mut n: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while n > 0 {
        buf.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    String::from_utf8_lossy(&buf).into_owned()
}
