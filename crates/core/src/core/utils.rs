/// Форматирует денежную сумму с разделителями тысяч.
///
/// Используется в описаниях записей истории переводов и кредитов,
/// чтобы сообщения совпадали с тем, что видит игрок в интерфейсе.
///
/// # Example
///
/// ```
/// use kubyshka_core::core::utils::format_money;
///
/// assert_eq!(format_money(3000), "3,000");
/// assert_eq!(format_money(-1500), "-1,500");
/// ```
pub fn format_money(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    if amount < 0 {
        out.push('-');
    }

    let len = digits.len();
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}
