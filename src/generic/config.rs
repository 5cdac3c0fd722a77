use serde::{Deserialize, Serialize};

/// Board size and win length of a game.
///
/// Values are always normalized: `size` lies in `[MIN_SIZE, MAX_SIZE]` and
/// `win_length` in `[MIN_WIN_LENGTH, size]`. Out-of-range input is clamped
/// instead of rejected, since these settings are typed in by players.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase", from = "RawConfig")]
pub struct GameConfig {
    size: usize,
    win_length: usize,
}

/// Unchecked settings as they arrive from outside.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    size: i64,
    win_length: i64,
}

impl From<RawConfig> for GameConfig {
    fn from(raw: RawConfig) -> Self {
        Self::normalized(raw.size, raw.win_length)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::with_size(Self::DEFAULT_SIZE)
    }
}

impl GameConfig {
    pub const MIN_SIZE: usize = 3;
    pub const MAX_SIZE: usize = 25;
    pub const MIN_WIN_LENGTH: usize = 3;
    pub const DEFAULT_SIZE: usize = 15;

    /// Clamps both values into their valid ranges.
    pub fn normalized(size: i64, win_length: i64) -> Self {
        let size = size.clamp(Self::MIN_SIZE as i64, Self::MAX_SIZE as i64) as usize;
        let win_length = win_length.clamp(Self::MIN_WIN_LENGTH as i64, size as i64) as usize;
        Self { size, win_length }
    }

    /// A board of `size` with the default win length for that size.
    pub fn with_size(size: usize) -> Self {
        let size = size.clamp(Self::MIN_SIZE, Self::MAX_SIZE);
        Self {
            size,
            win_length: Self::default_win_length(size),
        }
    }

    /// Builds a config from raw text input.
    ///
    /// Only the leading integer of each value counts, so `"12abc"` reads as
    /// 12 and `"4.5"` as 4. Input without one falls back: size to
    /// [`GameConfig::DEFAULT_SIZE`], win length to
    /// [`GameConfig::default_win_length`].
    pub fn from_input(size: &str, win_length: &str) -> Self {
        let size = leading_integer(size)
            .unwrap_or(Self::DEFAULT_SIZE as i64)
            .clamp(Self::MIN_SIZE as i64, Self::MAX_SIZE as i64);
        let win_length = leading_integer(win_length)
            .unwrap_or_else(|| Self::default_win_length(size as usize) as i64);
        Self::normalized(size, win_length)
    }

    /// Five in a row on large boards, three on small ones.
    pub fn default_win_length(size: usize) -> usize {
        if size >= 10 {
            5
        } else {
            3
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn win_length(&self) -> usize {
        self.win_length
    }
}

/// Optional sign followed by digits at the start of `input`, ignoring
/// surrounding whitespace.
fn leading_integer(input: &str) -> Option<i64> {
    let input = input.trim();
    let digits_start = usize::from(input.starts_with(['+', '-']));
    let digits_end = input[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(input.len(), |end| digits_start + end);
    if digits_end == digits_start {
        return None;
    }
    // saturate overly long numbers, they are clamped anyway
    Some(input[..digits_end].parse::<i64>().unwrap_or(if input.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    }))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn clamps_size_and_win_length() {
        assert_eq!(GameConfig::normalized(1, 1), GameConfig::normalized(3, 3));
        let config = GameConfig::normalized(100, 100);
        assert_eq!((config.size(), config.win_length()), (25, 25));
        let config = GameConfig::normalized(4, 9);
        assert_eq!((config.size(), config.win_length()), (4, 4));
        let config = GameConfig::normalized(-7, 5);
        assert_eq!((config.size(), config.win_length()), (3, 3));
    }

    #[test]
    fn default_win_length_depends_on_size() {
        assert_eq!(GameConfig::with_size(3).win_length(), 3);
        assert_eq!(GameConfig::with_size(9).win_length(), 3);
        assert_eq!(GameConfig::with_size(10).win_length(), 5);
        assert_eq!(GameConfig::default().size(), 15);
        assert_eq!(GameConfig::default().win_length(), 5);
    }

    #[test]
    fn falls_back_on_non_numeric_input() {
        let config = GameConfig::from_input("abc", "");
        assert_eq!((config.size(), config.win_length()), (15, 5));

        let config = GameConfig::from_input("7", "x");
        assert_eq!((config.size(), config.win_length()), (7, 3));

        let config = GameConfig::from_input(" 12 ", "4");
        assert_eq!((config.size(), config.win_length()), (12, 4));

        let config = GameConfig::from_input("40", "nope");
        assert_eq!((config.size(), config.win_length()), (25, 5));
    }

    #[test]
    fn reads_leading_integers() {
        let config = GameConfig::from_input("12abc", "4.5");
        assert_eq!((config.size(), config.win_length()), (12, 4));

        let config = GameConfig::from_input("4.5", "-2x");
        assert_eq!((config.size(), config.win_length()), (4, 3));

        let config = GameConfig::from_input("+9", "99999999999999999999999");
        assert_eq!((config.size(), config.win_length()), (9, 9));

        let config = GameConfig::from_input("-", "x12");
        assert_eq!((config.size(), config.win_length()), (15, 5));
    }

    #[test]
    fn deserializing_clamps() {
        let config: GameConfig = serde_json::from_str(r#"{"size":40,"winLength":0}"#).unwrap();
        assert_eq!((config.size(), config.win_length()), (25, 3));

        let config: GameConfig = serde_json::from_str(r#"{"size":-4,"winLength":9}"#).unwrap();
        assert_eq!((config.size(), config.win_length()), (3, 3));

        let config = GameConfig::normalized(12, 6);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"size":12,"winLength":6}"#);
        assert_eq!(serde_json::from_str::<GameConfig>(&json).unwrap(), config);
    }
}
