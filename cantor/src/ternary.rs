/// Three-valued answer for queries that are sound but not complete.
///
/// The membership oracle, subset check and semantic set equality all return
/// this instead of throwing: `Unknown` means the engine declines to decide,
/// never that it guessed.
///
/// Notably `False.and(..) == False` and `True.or(..) == True` without
/// evaluating the other side.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Ternary {
    True,
    False,
    Unknown,
}

impl Ternary {
    /// Short-circuiting conjunction; the closure only runs if needed.
    pub fn and(self, other: impl FnOnce() -> Ternary) -> Ternary {
        match self {
            Ternary::False => Ternary::False,
            Ternary::True => other(),
            Ternary::Unknown => match other() {
                Ternary::False => Ternary::False,
                _ => Ternary::Unknown,
            },
        }
    }

    /// Short-circuiting disjunction; the closure only runs if needed.
    pub fn or(self, other: impl FnOnce() -> Ternary) -> Ternary {
        match self {
            Ternary::True => Ternary::True,
            Ternary::False => other(),
            Ternary::Unknown => match other() {
                Ternary::True => Ternary::True,
                _ => Ternary::Unknown,
            },
        }
    }

    pub fn not(self) -> Ternary {
        match self {
            Ternary::True => Ternary::False,
            Ternary::False => Ternary::True,
            Ternary::Unknown => Ternary::Unknown,
        }
    }

    pub fn is_true(self) -> bool {
        self == Ternary::True
    }

    pub fn is_false(self) -> bool {
        self == Ternary::False
    }

    pub fn is_unknown(self) -> bool {
        self == Ternary::Unknown
    }
}

impl From<bool> for Ternary {
    fn from(value: bool) -> Self {
        if value {
            Ternary::True
        } else {
            Ternary::False
        }
    }
}
