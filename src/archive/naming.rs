//! Entry naming and prefix parsing
//!
//! Every archive entry is named `NNNNN-<base>`, where `NNNNN` is the zero-padded
//! sequence number and `<base>` is the sanitized image location.

/// Minimum width of the numeric prefix
pub const SEQUENCE_WIDTH: usize = 5;

/// Separator between the sequence number and the base name
pub const SEPARATOR: char = '-';

/// Replaces every character that is neither alphanumeric nor `.` with `_`
///
/// # Example
///
/// ```
/// use page_hoard::archive::sanitize_base_name;
///
/// assert_eq!(
///     sanitize_base_name("https://cdn.example.com/img?id=42&w=9"),
///     "https___cdn.example.com_img_id_42_w_9"
/// );
/// ```
pub fn sanitize_base_name(image_url: &str) -> String {
    image_url
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '.' { c } else { '_' })
        .collect()
}

/// Builds the entry name for a sequence number and an already sanitized base name
pub fn entry_name(sequence: u32, base_name: &str) -> String {
    format!(
        "{:0width$}{}{}",
        sequence,
        SEPARATOR,
        base_name,
        width = SEQUENCE_WIDTH
    )
}

/// Splits an existing entry name into its sequence number and base name
///
/// Returns `None` for names that do not start with at least [`SEQUENCE_WIDTH`] ASCII
/// digits followed by [`SEPARATOR`]. Such legacy names must not be sliced blindly.
pub fn parse_entry_name(name: &str) -> Option<(u32, &str)> {
    let digits = name.bytes().take_while(u8::is_ascii_digit).count();
    if digits < SEQUENCE_WIDTH {
        return None;
    }

    let rest = name[digits..].strip_prefix(SEPARATOR)?;
    let sequence = name[..digits].parse().ok()?;
    Some((sequence, rest))
}

/// Returns the base name used for deduplication of an existing entry
///
/// Well-formed names yield their base; legacy names are compared whole.
pub fn base_name_of(name: &str) -> &str {
    match parse_entry_name(name) {
        Some((_, base)) => base,
        None => {
            tracing::debug!("Entry '{}' has no sequence prefix, comparing whole name", name);
            name
        }
    }
}
