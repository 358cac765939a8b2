//! Fixed 5×7 bitmap glyphs for canvas text.
//!
//! Each glyph row is a 5-bit mask, most significant bit leftmost.
//! Lowercase letters fold to uppercase; anything else unknown renders
//! the fallback bitmap.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Seven rows of 5-bit pixel masks.
pub type Glyph = [u8; 7];

/// Rendered for characters outside the table.
pub const FALLBACK_GLYPH: Glyph = [
    0b11111, 0b00001, 0b00110, 0b00100, 0b00000, 0b00100, 0b00000,
];

static GLYPHS: Lazy<HashMap<char, Glyph>> = Lazy::new(|| {
    HashMap::from([
        (' ', [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000]),
        ('!', [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00000, 0b00100]),
        ('"', [0b01010, 0b01010, 0b01010, 0b00000, 0b00000, 0b00000, 0b00000]),
        ('#', [0b01010, 0b11111, 0b01010, 0b01010, 0b11111, 0b01010, 0b00000]),
        ('$', [0b00100, 0b01111, 0b10100, 0b01110, 0b00101, 0b11110, 0b00100]),
        ('%', [0b11001, 0b11010, 0b00100, 0b01000, 0b10110, 0b00110, 0b00000]),
        ('&', [0b01100, 0b10010, 0b10100, 0b01000, 0b10101, 0b10010, 0b01101]),
        ('\'', [0b00110, 0b00100, 0b01000, 0b00000, 0b00000, 0b00000, 0b00000]),
        ('(', [0b00010, 0b00100, 0b01000, 0b01000, 0b01000, 0b00100, 0b00010]),
        (')', [0b01000, 0b00100, 0b00010, 0b00010, 0b00010, 0b00100, 0b01000]),
        ('*', [0b00000, 0b10101, 0b01110, 0b11111, 0b01110, 0b10101, 0b00000]),
        ('+', [0b00000, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000]),
        (',', [0b00000, 0b00000, 0b00000, 0b00000, 0b00110, 0b00100, 0b01000]),
        ('-', [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000]),
        ('.', [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00110, 0b00110]),
        ('/', [0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b00000, 0b00000]),
        ('0', [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110]),
        ('1', [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
        ('2', [0b01110, 0b10001, 0b00001, 0b00110, 0b01000, 0b10000, 0b11111]),
        ('3', [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110]),
        ('4', [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010]),
        ('5', [0b11111, 0b10000, 0b10000, 0b11110, 0b00001, 0b00001, 0b11110]),
        ('6', [0b00111, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110]),
        ('7', [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000]),
        ('8', [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110]),
        ('9', [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b11100]),
        (':', [0b00000, 0b00110, 0b00110, 0b00000, 0b00110, 0b00110, 0b00000]),
        (';', [0b00000, 0b00110, 0b00110, 0b00000, 0b00110, 0b00100, 0b01000]),
        ('<', [0b00010, 0b00100, 0b01000, 0b10000, 0b01000, 0b00100, 0b00010]),
        ('=', [0b00000, 0b00000, 0b11111, 0b00000, 0b11111, 0b00000, 0b00000]),
        ('>', [0b01000, 0b00100, 0b00010, 0b00001, 0b00010, 0b00100, 0b01000]),
        ('?', [0b01110, 0b10001, 0b00001, 0b00110, 0b00100, 0b00000, 0b00100]),
        ('@', [0b01110, 0b10001, 0b10111, 0b10101, 0b10111, 0b10000, 0b01110]),
        ('A', [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
        ('B', [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110]),
        ('C', [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110]),
        ('D', [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100]),
        ('E', [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111]),
        ('F', [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000]),
        ('G', [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01110]),
        ('H', [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
        ('I', [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
        ('J', [0b00001, 0b00001, 0b00001, 0b00001, 0b10001, 0b10001, 0b01110]),
        ('K', [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001]),
        ('L', [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111]),
        ('M', [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001]),
        ('N', [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001]),
        ('O', [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
        ('P', [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000]),
        ('Q', [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101]),
        ('R', [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001]),
        ('S', [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110]),
        ('T', [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100]),
        ('U', [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
        ('V', [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100]),
        ('W', [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010]),
        ('X', [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001]),
        ('Y', [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100]),
        ('Z', [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111]),
        ('[', [0b01110, 0b01000, 0b01000, 0b01000, 0b01000, 0b01000, 0b01110]),
        ('\\', [0b10000, 0b01000, 0b00100, 0b00010, 0b00001, 0b00000, 0b00000]),
        (']', [0b01110, 0b00010, 0b00010, 0b00010, 0b00010, 0b00010, 0b01110]),
        ('^', [0b00100, 0b01010, 0b10001, 0b00000, 0b00000, 0b00000, 0b00000]),
        ('_', [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b11111]),
        ('`', [0b01000, 0b00100, 0b00010, 0b00000, 0b00000, 0b00000, 0b00000]),
        ('{', [0b00010, 0b00100, 0b00100, 0b01000, 0b00100, 0b00100, 0b00010]),
        ('|', [0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100]),
        ('}', [0b01000, 0b00100, 0b00100, 0b00010, 0b00100, 0b00100, 0b01000]),
        ('~', [0b01001, 0b10110, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000]),
    ])
});

/// Glyph bitmap for a character, folding lowercase to uppercase.
#[must_use]
pub fn glyph_for_char(character: char) -> &'static Glyph {
    let folded = if character.is_ascii_lowercase() {
        character.to_ascii_uppercase()
    } else {
        character
    };
    GLYPHS.get(&folded).unwrap_or(&FALLBACK_GLYPH)
}

#[cfg(test)]
mod tests {
    use super::{FALLBACK_GLYPH, glyph_for_char};

    #[test]
    fn lowercase_folds_to_uppercase() {
        assert_eq!(glyph_for_char('a'), glyph_for_char('A'));
        assert_ne!(glyph_for_char('A'), &FALLBACK_GLYPH);
    }

    #[test]
    fn unknown_characters_use_the_fallback() {
        assert_eq!(glyph_for_char('\u{00e9}'), &FALLBACK_GLYPH);
        assert_eq!(glyph_for_char('\u{4e16}'), &FALLBACK_GLYPH);
    }

    #[test]
    fn space_is_blank() {
        assert!(glyph_for_char(' ').iter().all(|&row| row == 0));
    }
}
