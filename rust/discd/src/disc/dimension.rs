use std::fmt;

/// The four behavioral dimensions, always iterated in D, I, S, C order.
///
/// The adjective data does not name dimensions directly; it uses the shape
/// codes `Z`, `S`, `T` and `*` for D, I, S and C respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    D,
    I,
    S,
    C,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [Dimension::D, Dimension::I, Dimension::S, Dimension::C];

    pub fn index(self) -> usize {
        match self {
            Dimension::D => 0,
            Dimension::I => 1,
            Dimension::S => 2,
            Dimension::C => 3,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Dimension::D => 'D',
            Dimension::I => 'I',
            Dimension::S => 'S',
            Dimension::C => 'C',
        }
    }

    pub fn shape_code(self) -> &'static str {
        match self {
            Dimension::D => "Z",
            Dimension::I => "S",
            Dimension::S => "T",
            Dimension::C => "*",
        }
    }

    pub fn from_shape_code(code: &str) -> Option<Self> {
        match code.trim() {
            "Z" => Some(Dimension::D),
            "S" => Some(Dimension::I),
            "T" => Some(Dimension::S),
            "*" => Some(Dimension::C),
            _ => None,
        }
    }

    pub fn from_letter(letter: &str) -> Option<Self> {
        match letter.trim().to_ascii_uppercase().as_str() {
            "D" => Some(Dimension::D),
            "I" => Some(Dimension::I),
            "S" => Some(Dimension::S),
            "C" => Some(Dimension::C),
            _ => None,
        }
    }

    pub fn full_name(self) -> &'static str {
        match self {
            Dimension::D => "Dominance",
            Dimension::I => "Influence",
            Dimension::S => "Steadiness",
            Dimension::C => "Conscientiousness",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_codes_map_to_disc_order() {
        let codes: Vec<&str> = Dimension::ALL.iter().map(|d| d.shape_code()).collect();
        assert_eq!(codes, vec!["Z", "S", "T", "*"]);
        for d in Dimension::ALL {
            assert_eq!(Dimension::from_shape_code(d.shape_code()), Some(d));
            assert_eq!(Dimension::ALL[d.index()], d);
        }
    }

    #[test]
    fn unknown_shape_codes_are_rejected() {
        assert_eq!(Dimension::from_shape_code("N"), None);
        assert_eq!(Dimension::from_shape_code(""), None);
        // Letters and shape codes overlap on "S" but mean different dimensions.
        assert_eq!(Dimension::from_shape_code("S"), Some(Dimension::I));
        assert_eq!(Dimension::from_letter("s"), Some(Dimension::S));
    }
}
