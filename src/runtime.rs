// Copyright (c) 2026 rezky_nightky

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Mono,
    Color16,
    Color256,
    TrueColor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorScheme {
    Green,
    Amber,
    Cyan,
    Red,
    Purple,
    Ice,
}

impl ColorScheme {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim().to_ascii_lowercase().as_str() {
            "green" | "matrix" => Ok(Self::Green),
            "amber" | "gold" => Ok(Self::Amber),
            "cyan" => Ok(Self::Cyan),
            "red" | "alert" => Ok(Self::Red),
            "purple" | "violet" => Ok(Self::Purple),
            "ice" | "snow" => Ok(Self::Ice),
            _ => Err(format!("invalid color: {} (see --list-colors)", s)),
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cadence {
    // Next frame one period after the previous one finished.
    #[value(name = "continuous")]
    Continuous,
    // Fixed-rate grid; late frames are dropped.
    #[value(name = "fixed")]
    Fixed,
}

#[cfg(test)]
mod tests {
    use super::ColorScheme;

    #[test]
    fn parse_accepts_aliases_case_insensitively() {
        assert_eq!(ColorScheme::parse(" Matrix ").unwrap(), ColorScheme::Green);
        assert_eq!(ColorScheme::parse("GOLD").unwrap(), ColorScheme::Amber);
        assert!(ColorScheme::parse("plaid").is_err());
    }
}
