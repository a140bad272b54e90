use livetrace_common::{InstructionPoint, InstructionPointMap, Offset};
use log::debug;
use std::borrow::Cow;

/// Label used for any offset missing from the instruction point map.
pub const UNKNOWN_LABEL: &str = "(unknown)";

/// Anything that can name an offset in an instruction point map.
///
/// Map keys are decimal strings, so numeric offsets are rendered before the
/// lookup. Values that can never be a key (negative numbers, `None`) yield
/// `None` and resolve to [`Resolution::Unresolved`].
pub trait OffsetKey {
    fn offset_key(&self) -> Option<Cow<'_, str>>;
}

impl OffsetKey for Offset {
    fn offset_key(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.as_str()))
    }
}

impl OffsetKey for str {
    fn offset_key(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self))
    }
}

impl OffsetKey for String {
    fn offset_key(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self))
    }
}

impl OffsetKey for u64 {
    fn offset_key(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Owned(self.to_string()))
    }
}

impl OffsetKey for i64 {
    fn offset_key(&self) -> Option<Cow<'_, str>> {
        (*self >= 0).then(|| Cow::Owned(self.to_string()))
    }
}

impl<T: OffsetKey> OffsetKey for Option<T> {
    fn offset_key(&self) -> Option<Cow<'_, str>> {
        self.as_ref().and_then(|inner| inner.offset_key())
    }
}

impl<T: OffsetKey + ?Sized> OffsetKey for &T {
    fn offset_key(&self) -> Option<Cow<'_, str>> {
        (**self).offset_key()
    }
}

/// Source location of a resolved instruction point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation<'a> {
    pub file: &'a str,
    pub line: u64,
}

/// Result of looking up one offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    Resolved {
        function: &'a str,
        displacement: u64,
        /// `None` when the backend found the symbol but no line info.
        source: Option<SourceLocation<'a>>,
    },
    Unresolved,
}

impl Resolution<'_> {
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    /// `function+0xDISP`, or `(unknown)`.
    #[must_use]
    pub fn function_label(&self) -> String {
        match self {
            Self::Resolved { function, displacement, .. } => {
                format!("{function}+0x{displacement}")
            }
            Self::Unresolved => UNKNOWN_LABEL.to_string(),
        }
    }

    /// `file:line`, empty when there is no source info, or `(unknown)`.
    #[must_use]
    pub fn source_label(&self) -> String {
        match self {
            Self::Resolved { source: Some(loc), .. } => format!("{}:{}", loc.file, loc.line),
            Self::Resolved { source: None, .. } => String::new(),
            Self::Unresolved => UNKNOWN_LABEL.to_string(),
        }
    }
}

/// Looks up offsets in one snapshot's instruction point map.
///
/// Borrowing the map ties every label to a single snapshot, so a view can
/// never resolve offsets from one snapshot against the symbols of another.
#[derive(Debug, Clone, Copy)]
pub struct SymbolResolver<'a> {
    points: &'a InstructionPointMap,
}

impl<'a> SymbolResolver<'a> {
    #[must_use]
    pub fn new(points: &'a InstructionPointMap) -> Self {
        Self { points }
    }

    /// Resolve an offset given as an `Offset`, a string key, an integer or
    /// an `Option` of any of those.
    pub fn resolve<Q: OffsetKey + ?Sized>(&self, offset: &Q) -> Resolution<'a> {
        offset
            .offset_key()
            .and_then(|key| self.points.get(&*key))
            .map_or(Resolution::Unresolved, resolve_point)
    }

    /// Resolve an offset that may be absent (e.g. a thread with no location).
    pub fn resolve_optional(&self, offset: Option<&Offset>) -> Resolution<'a> {
        self.resolve(&offset)
    }

    pub fn resolve_function<Q: OffsetKey + ?Sized>(&self, offset: &Q) -> String {
        self.resolve(offset).function_label()
    }

    pub fn resolve_source<Q: OffsetKey + ?Sized>(&self, offset: &Q) -> String {
        self.resolve(offset).source_label()
    }
}

fn resolve_point(point: &InstructionPoint) -> Resolution<'_> {
    let source = point
        .source_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .map(|file| SourceLocation { file, line: point.source_line.unwrap_or(0) });

    Resolution::Resolved {
        function: &point.function_name,
        displacement: parse_displacement(&point.displacement),
        source,
    }
}

/// Parse a base-16 displacement, with or without a `0x` prefix.
///
/// Anything unparseable resolves to 0 so the label stays `function+0x0`.
fn parse_displacement(raw: &str) -> u64 {
    let digits = raw.trim();
    let digits =
        digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")).unwrap_or(digits);

    u64::from_str_radix(digits, 16).unwrap_or_else(|_| {
        debug!("Malformed displacement {raw:?}, using 0");
        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(function: &str, displacement: &str, source: Option<(&str, u64)>) -> InstructionPoint {
        InstructionPoint {
            function_name: function.to_string(),
            displacement: displacement.to_string(),
            source_name: source.map(|(file, _)| file.to_string()),
            source_line: source.map(|(_, line)| line),
        }
    }

    fn test_map() -> InstructionPointMap {
        let mut map = InstructionPointMap::new();
        map.insert(Offset::from(10_u64), point("main", "1a", Some(("main.cc", 42))));
        map.insert(Offset::from(20_u64), point("worker", "0", None));
        map.insert(Offset::from(30_u64), point("helper", "zz", Some(("", 7))));
        map
    }

    #[test]
    fn test_resolve_function_prints_parsed_displacement() {
        let map = test_map();
        let resolver = SymbolResolver::new(&map);
        // "1a" is hex; the label carries its decimal value
        assert_eq!(resolver.resolve_function("10"), "main+0x26");
        assert_eq!(resolver.resolve_function("20"), "worker+0x0");
    }

    #[test]
    fn test_unknown_offset() {
        let map = test_map();
        let resolver = SymbolResolver::new(&map);
        assert_eq!(resolver.resolve("99"), Resolution::Unresolved);
        assert_eq!(resolver.resolve_function("99"), UNKNOWN_LABEL);
        assert_eq!(resolver.resolve_source("99"), UNKNOWN_LABEL);
    }

    #[test]
    fn test_missing_source_is_empty_not_unknown() {
        let map = test_map();
        let resolver = SymbolResolver::new(&map);
        assert_eq!(resolver.resolve_source("20"), "");
        // empty source name counts as missing
        assert_eq!(resolver.resolve_source("30"), "");
        assert_eq!(resolver.resolve_source("10"), "main.cc:42");
    }

    #[test]
    fn test_malformed_displacement_falls_back_to_zero() {
        let map = test_map();
        let resolver = SymbolResolver::new(&map);
        assert_eq!(resolver.resolve_function("30"), "helper+0x0");
    }

    #[test]
    fn test_parse_displacement_variants() {
        assert_eq!(parse_displacement("ff"), 255);
        assert_eq!(parse_displacement("0x10"), 16);
        assert_eq!(parse_displacement("0X10"), 16);
        assert_eq!(parse_displacement("16"), 22);
        assert_eq!(parse_displacement(""), 0);
        assert_eq!(parse_displacement("-"), 0);
    }

    #[test]
    fn test_resolve_optional() {
        let map = test_map();
        let resolver = SymbolResolver::new(&map);
        assert!(!resolver.resolve_optional(None).is_resolved());
        assert!(resolver.resolve_optional(Some(&Offset::from(10_u64))).is_resolved());
    }

    #[test]
    fn test_numeric_and_optional_offsets() {
        let map = test_map();
        let resolver = SymbolResolver::new(&map);
        assert_eq!(resolver.resolve_function(&10_u64), "main+0x26");
        assert_eq!(resolver.resolve_function(&20_i64), "worker+0x0");
        assert_eq!(resolver.resolve_source(&String::from("10")), "main.cc:42");
        assert_eq!(resolver.resolve_function(&Some(10_i64)), "main+0x26");
        assert_eq!(resolver.resolve(&None::<i64>), Resolution::Unresolved);
        assert_eq!(resolver.resolve_function(&99_u64), UNKNOWN_LABEL);
    }

    #[test]
    fn test_negative_offset_is_never_present() {
        let mut map = test_map();
        map.insert(Offset::from("-1"), point("bogus", "0", None));
        let resolver = SymbolResolver::new(&map);
        assert_eq!(resolver.resolve(&-1_i64), Resolution::Unresolved);
        assert_eq!(resolver.resolve_source(&Some(-1_i64)), UNKNOWN_LABEL);
    }
}
