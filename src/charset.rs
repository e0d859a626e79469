//! Translation between Cyrillic text and the symbol codes of the WS0010
//! english-russian font table.
//!
//! The font reuses ASCII codes for lookalike glyphs (А shares 0x41 with
//! latin A, о shares 0x6F with latin o, and so on), so decoding a byte
//! that was encoded from a latin character may yield its Cyrillic twin.
//! That is how the hardware font is laid out, not a defect here.

/// Characters with an explicit symbol code, sorted by character.
const TO_SYMBOL: [(char, u8); 66] = [
    ('Ё', 0xA2),
    ('А', 0x41),
    ('Б', 0xA0),
    ('В', 0x42),
    ('Г', 0xA1),
    ('Д', 0xE0),
    ('Е', 0x45),
    ('Ж', 0xA3),
    ('З', 0xA4),
    ('И', 0xA5),
    ('Й', 0xA6),
    ('К', 0x4B),
    ('Л', 0xA7),
    ('М', 0x4D),
    ('Н', 0x48),
    ('О', 0x4F),
    ('П', 0xA8),
    ('Р', 0x50),
    ('С', 0x43),
    ('Т', 0x54),
    ('У', 0xA9),
    ('Ф', 0xAA),
    ('Х', 0x58),
    ('Ц', 0xE1),
    ('Ч', 0xAB),
    ('Ш', 0xAC),
    ('Щ', 0xE2),
    ('Ъ', 0xAD),
    ('Ы', 0xAE),
    ('Ь', 0x62),
    ('Э', 0xAF),
    ('Ю', 0xB0),
    ('Я', 0xB1),
    ('а', 0x61),
    ('б', 0xB2),
    ('в', 0xB3),
    ('г', 0xB4),
    ('д', 0xE3),
    ('е', 0x65),
    ('ж', 0xB6),
    ('з', 0xB7),
    ('и', 0xB8),
    ('й', 0xB9),
    ('к', 0xBA),
    ('л', 0xBB),
    ('м', 0xBC),
    ('н', 0xBD),
    ('о', 0x6F),
    ('п', 0xBE),
    ('р', 0x70),
    ('с', 0x63),
    ('т', 0xBF),
    ('у', 0x79),
    ('ф', 0xE4),
    ('х', 0x78),
    ('ц', 0xE5),
    ('ч', 0xC0),
    ('ш', 0xC1),
    ('щ', 0xE6),
    ('ъ', 0xC2),
    ('ы', 0xC3),
    ('ь', 0xC4),
    ('э', 0xC5),
    ('ю', 0xC6),
    ('я', 0xC7),
    ('ё', 0xB5),
];

/// The same mapping keyed by symbol code, sorted by code.
const FROM_SYMBOL: [(u8, char); 66] = [
    (0x41, 'А'),
    (0x42, 'В'),
    (0x43, 'С'),
    (0x45, 'Е'),
    (0x48, 'Н'),
    (0x4B, 'К'),
    (0x4D, 'М'),
    (0x4F, 'О'),
    (0x50, 'Р'),
    (0x54, 'Т'),
    (0x58, 'Х'),
    (0x61, 'а'),
    (0x62, 'Ь'),
    (0x63, 'с'),
    (0x65, 'е'),
    (0x6F, 'о'),
    (0x70, 'р'),
    (0x78, 'х'),
    (0x79, 'у'),
    (0xA0, 'Б'),
    (0xA1, 'Г'),
    (0xA2, 'Ё'),
    (0xA3, 'Ж'),
    (0xA4, 'З'),
    (0xA5, 'И'),
    (0xA6, 'Й'),
    (0xA7, 'Л'),
    (0xA8, 'П'),
    (0xA9, 'У'),
    (0xAA, 'Ф'),
    (0xAB, 'Ч'),
    (0xAC, 'Ш'),
    (0xAD, 'Ъ'),
    (0xAE, 'Ы'),
    (0xAF, 'Э'),
    (0xB0, 'Ю'),
    (0xB1, 'Я'),
    (0xB2, 'б'),
    (0xB3, 'в'),
    (0xB4, 'г'),
    (0xB5, 'ё'),
    (0xB6, 'ж'),
    (0xB7, 'з'),
    (0xB8, 'и'),
    (0xB9, 'й'),
    (0xBA, 'к'),
    (0xBB, 'л'),
    (0xBC, 'м'),
    (0xBD, 'н'),
    (0xBE, 'п'),
    (0xBF, 'т'),
    (0xC0, 'ч'),
    (0xC1, 'ш'),
    (0xC2, 'ъ'),
    (0xC3, 'ы'),
    (0xC4, 'ь'),
    (0xC5, 'э'),
    (0xC6, 'ю'),
    (0xC7, 'я'),
    (0xE0, 'Д'),
    (0xE1, 'Ц'),
    (0xE2, 'Щ'),
    (0xE3, 'д'),
    (0xE4, 'ф'),
    (0xE5, 'ц'),
    (0xE6, 'щ'),
];

/// Symbol code for a character. Unmapped characters fall back to their
/// code point truncated to one byte.
pub fn encode(c: char) -> u8 {
    match TO_SYMBOL.binary_search_by_key(&c, |&(ch, _)| ch) {
        Ok(i) => TO_SYMBOL[i].1,
        Err(_) => c as u32 as u8,
    }
}

/// Character for a symbol code read back from DDRAM. Unmapped codes are
/// interpreted as the code point itself.
pub fn decode(symbol: u8) -> char {
    match FROM_SYMBOL.binary_search_by_key(&symbol, |&(s, _)| s) {
        Ok(i) => FROM_SYMBOL[i].1,
        Err(_) => char::from(symbol),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapped_characters_round_trip() {
        for &(c, symbol) in TO_SYMBOL.iter() {
            assert_eq!(encode(c), symbol);
            assert_eq!(decode(symbol), c, "symbol {:#04x}", symbol);
        }
    }

    #[test]
    fn unmapped_characters_truncate_to_code_point() {
        assert_eq!(encode('Z'), 0x5A);
        assert_eq!(encode(' '), 0x20);
        // code point above one byte, low byte kept
        assert_eq!(encode('\u{0521}'), 0x21);
    }

    #[test]
    fn unmapped_symbols_decode_as_code_point() {
        assert_eq!(decode(0x5A), 'Z');
        assert_eq!(decode(0x20), ' ');
        assert_eq!(decode(0xFF), '\u{00FF}');
    }

    #[test]
    fn tables_are_sorted_and_mutually_consistent() {
        assert!(TO_SYMBOL.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(FROM_SYMBOL.windows(2).all(|w| w[0].0 < w[1].0));
        for &(c, symbol) in TO_SYMBOL.iter() {
            let i = FROM_SYMBOL
                .binary_search_by_key(&symbol, |&(s, _)| s)
                .unwrap();
            assert_eq!(FROM_SYMBOL[i].1, c);
        }
    }
}
