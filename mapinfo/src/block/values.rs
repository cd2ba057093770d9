use crate::block::BlockRef;
use crate::document::{Links, TokenRef};
use crate::small_string::SmallString;

impl<'a> BlockRef<'a> {
    /// Value-name tokens in the order they appear in the block.
    pub fn values(&self) -> Links<'a> {
        Links::chain(self.block.values.map(|id| TokenRef::new(self.document, id)))
    }

    /// Finds a value by name (case-insensitive).
    pub fn value(&self, name: &str) -> Option<TokenRef<'a>> {
        self.values().find(|token| token.text_eq_ignore_case(name))
    }

    /// Only the first data token is consulted. A value with no data is a flag
    /// and reads as 1; a missing value or a non-numeric first entry yields `default`.
    pub fn single_number_value(&self, name: &str, default: f32) -> f32 {
        let Some(value) = self.value(name) else {
            return default;
        };
        match value.next_data() {
            Some(data) => data.as_number().unwrap_or(default),
            None => 1.0,
        }
    }

    pub fn single_int_value(&self, name: &str, default: i32) -> i32 {
        self.single_number_value(name, default as f32) as i32
    }

    /// Text of the first data token. Flags and missing values yield `default`.
    pub fn single_str_value<'d>(&self, name: &str, default: &'d str) -> &'d str
    where
        'a: 'd,
    {
        self.value(name)
            .and_then(|value| value.next_data())
            .map_or(default, |data| data.text())
    }

    pub fn single_small_string_value<const N: usize>(
        &self,
        name: &str,
        default: &SmallString<N>,
    ) -> SmallString<N> {
        self.value(name)
            .and_then(|value| value.next_data())
            .map_or(*default, |data| SmallString::new(data.text()))
    }
}
