//! Channel name normalization for stream map keys

/// Turn a human readable channel name into a stream map key.
///
/// The name is lowercased and every space and hyphen becomes an underscore.
/// Applying it twice gives the same result as applying it once.
///
/// ```rust
/// use transcode_server::utils::normalize_channel_name;
///
/// assert_eq!(normalize_channel_name("Das-Erste HD"), "das_erste_hd");
/// ```
pub fn normalize_channel_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other,
        })
        .collect()
}
