use alloc::borrow::Cow;

/// Settings shared by the read, write and clone drivers.
///
/// # Examples
///
/// ```
/// use weave_reflect::traverse::TraverseConfig;
///
/// let config = TraverseConfig {
///     bitmask_separator: ", ".into(),
///     strict_bitmask: true,
///     ..TraverseConfig::default()
/// };
/// assert_eq!(config.item_name, "item");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraverseConfig {
    /// Joins the flag names of a bitmask. Tokens are trimmed when read back.
    pub bitmask_separator: Cow<'static, str>,
    /// Fail a bitmask read on unknown flag names instead of skipping them.
    pub strict_bitmask: bool,
    /// Emplace a null `Option` when the archive or the clone source has a
    /// value for it, and reset it when the clone source is null.
    pub materialize_null_pointers: bool,
    /// Element name of container items.
    pub item_name: Cow<'static, str>,
    /// Element name of the key inside an associative item.
    pub key_name: Cow<'static, str>,
    /// Element name of the value inside an associative item.
    pub value_name: Cow<'static, str>,
}

impl Default for TraverseConfig {
    fn default() -> Self {
        Self {
            bitmask_separator: Cow::Borrowed("|"),
            strict_bitmask: false,
            materialize_null_pointers: false,
            item_name: Cow::Borrowed("item"),
            key_name: Cow::Borrowed("key"),
            value_name: Cow::Borrowed("value"),
        }
    }
}
