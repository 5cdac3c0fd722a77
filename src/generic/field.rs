use crate::Mark;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single cell of the board.
///
/// On the wire a field is a one character string: `" "`, `"X"` or `"O"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Field {
    #[default]
    Vacant,
    Occupied { mark: Mark },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown cell value {0:?}")]
pub struct UnknownField(pub String);

impl Field {
    pub fn mark(&self) -> Option<Mark> {
        match self {
            Field::Vacant => None,
            Field::Occupied { mark } => Some(*mark),
        }
    }

    pub fn is_vacant(&self) -> bool {
        matches!(self, Field::Vacant)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Field::Vacant => " ",
            Field::Occupied { mark: Mark::X } => "X",
            Field::Occupied { mark: Mark::O } => "O",
        }
    }
}

impl From<Mark> for Field {
    fn from(mark: Mark) -> Self {
        Field::Occupied { mark }
    }
}

impl From<Field> for String {
    fn from(field: Field) -> Self {
        field.symbol().to_string()
    }
}

impl TryFrom<String> for Field {
    type Error = UnknownField;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            // some peers send an empty string for a vacant cell
            " " | "" => Ok(Field::Vacant),
            "X" => Ok(Field::Occupied { mark: Mark::X }),
            "O" => Ok(Field::Occupied { mark: Mark::O }),
            _ => Err(UnknownField(value)),
        }
    }
}
