// Copyright (c) 2026 rezky_nightky

pub const GHOST_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789@#$%^&*()";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Charset {
    Ghost,
    Binary,
    Hex,
    Digits,
    Letters,
    Katakana,
    Matrix,
}

pub fn charset_from_str(spec: &str) -> Result<Charset, String> {
    match spec.trim().to_ascii_lowercase().as_str() {
        "ghost" | "default" => Ok(Charset::Ghost),
        "bin" | "binary" | "01" => Ok(Charset::Binary),
        "hex" | "hexadecimal" => Ok(Charset::Hex),
        "digits" | "dec" | "decimal" => Ok(Charset::Digits),
        "letters" | "english" => Ok(Charset::Letters),
        "katakana" => Ok(Charset::Katakana),
        "matrix" => Ok(Charset::Matrix),
        other => Err(format!(
            "unsupported charset: {} (see --list-charsets)",
            other
        )),
    }
}

fn push_range(out: &mut Vec<char>, start: u32, end: u32) {
    out.extend((start..=end).filter_map(char::from_u32));
}

pub fn build_chars(charset: Charset, custom: Option<&str>) -> Vec<char> {
    if let Some(custom) = custom {
        let mut out: Vec<char> = custom.chars().filter(|c| !c.is_control()).collect();
        out.dedup();
        if !out.is_empty() {
            return out;
        }
    }

    let mut out = Vec::new();
    match charset {
        Charset::Ghost => out.extend(GHOST_ALPHABET.chars()),
        Charset::Binary => push_range(&mut out, 0x30, 0x31),
        Charset::Hex => {
            push_range(&mut out, 0x30, 0x39);
            push_range(&mut out, 0x41, 0x46);
        }
        Charset::Digits => push_range(&mut out, 0x30, 0x39),
        Charset::Letters => {
            push_range(&mut out, 0x41, 0x5A);
            push_range(&mut out, 0x61, 0x7A);
        }
        Charset::Katakana => push_range(&mut out, 0xFF66, 0xFF9D),
        Charset::Matrix => {
            push_range(&mut out, 0x41, 0x5A);
            push_range(&mut out, 0x30, 0x39);
            push_range(&mut out, 0xFF66, 0xFF9D);
        }
    }

    if out.is_empty() {
        out.extend(['0', '1']);
    }
    out
}
