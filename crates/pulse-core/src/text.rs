// crates/pulse-core/src/text.rs

//! Name folding for state filters: user input such as `Tamil Nādu` and the
//! dataset's directory slugs (`tamil-nadu`) compare equal after
//! [`state_slug`].

/// Convert a string into a folded key suitable for comparison.
///
/// This performs:
/// 1\) Transliterate Unicode → ASCII (e.g. `Tamil Nādu` -> `Tamil Nadu`)
/// 2\) Normalize to lowercase
///
/// # Examples
///
/// ```rust
/// use pulse_core::text::fold_key;
///
/// assert_eq!(fold_key("Tamil Nādu"), "tamil nadu");
/// ```
pub fn fold_key(s: &str) -> String {
    deunicode::deunicode(s).to_lowercase()
}

/// Turns a human-entered state name into the directory slug the upstream
/// dataset uses (`andaman-&-nicobar-islands`, `uttar-pradesh`, …).
///
/// Already-slugged input comes back unchanged, so the function is safe to
/// apply to both CLI input and stored values.
///
/// ```rust
/// use pulse_core::text::state_slug;
///
/// assert_eq!(state_slug("Andaman & Nicobar Islands"), "andaman-&-nicobar-islands");
/// assert_eq!(state_slug("uttar-pradesh"), "uttar-pradesh");
/// ```
pub fn state_slug(s: &str) -> String {
    fold_key(s.trim())
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Inverse of [`state_slug`] for display: `jammu-&-kashmir` -> `Jammu & Kashmir`.
pub fn display_name(slug: &str) -> String {
    slug.split('-')
        .filter(|part| !part.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
