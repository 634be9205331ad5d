/// Преобразование печатаемых символов в evdev коды
/// Отвечает за трансляцию символов набираемого текста в числовые коды evdev
pub struct CharToEvdevCode;

impl CharToEvdevCode {
    /// Получить evdev код клавиши по символу
    pub fn translate(symbol: char) -> Result<u16, String> {
        let normalized = symbol.to_ascii_lowercase();
        let code = match normalized {
            // Буквенные клавиши
            'a' => 30,   // KEY_A
            'b' => 48,   // KEY_B
            'c' => 46,   // KEY_C
            'd' => 32,   // KEY_D
            'e' => 18,   // KEY_E
            'f' => 33,   // KEY_F
            'g' => 34,   // KEY_G
            'h' => 35,   // KEY_H
            'i' => 23,   // KEY_I
            'j' => 36,   // KEY_J
            'k' => 37,   // KEY_K
            'l' => 38,   // KEY_L
            'm' => 50,   // KEY_M
            'n' => 49,   // KEY_N
            'o' => 24,   // KEY_O
            'p' => 25,   // KEY_P
            'q' => 16,   // KEY_Q
            'r' => 19,   // KEY_R
            's' => 31,   // KEY_S
            't' => 20,   // KEY_T
            'u' => 22,   // KEY_U
            'v' => 47,   // KEY_V
            'w' => 17,   // KEY_W
            'x' => 45,   // KEY_X
            'y' => 21,   // KEY_Y
            'z' => 44,   // KEY_Z

            // Цифровые клавиши (верхний ряд)
            '1' => 2,    // KEY_1
            '2' => 3,    // KEY_2
            '3' => 4,    // KEY_3
            '4' => 5,    // KEY_4
            '5' => 6,    // KEY_5
            '6' => 7,    // KEY_6
            '7' => 8,    // KEY_7
            '8' => 9,    // KEY_8
            '9' => 10,   // KEY_9
            '0' => 11,   // KEY_0

            // Специальные клавиши
            ' ' => 57,   // KEY_SPACE
            '\n' => 28,  // KEY_ENTER
            '\t' => 15,  // KEY_TAB

            _ => {
                return Err(format!("Символ '{}' не поддерживается для печати", symbol));
            }
        };

        Ok(code)
    }

    /// Символы, которые гарантированно транслируются (рабочий алфавит бота)
    pub fn supported_charset() -> &'static str {
        "abcdefghijklmnopqrstuvwxyz0123456789 "
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_letters_and_digits() {
        assert_eq!(CharToEvdevCode::translate('a'), Ok(30));
        assert_eq!(CharToEvdevCode::translate('z'), Ok(44));
        assert_eq!(CharToEvdevCode::translate('0'), Ok(11));
        assert_eq!(CharToEvdevCode::translate('9'), Ok(10));
        assert_eq!(CharToEvdevCode::translate(' '), Ok(57));
    }

    #[test]
    fn test_translate_is_case_insensitive() {
        assert_eq!(
            CharToEvdevCode::translate('Q'),
            CharToEvdevCode::translate('q')
        );
    }

    #[test]
    fn test_translate_rejects_unknown_symbols() {
        assert!(CharToEvdevCode::translate('ы').is_err());
        assert!(CharToEvdevCode::translate('%').is_err());
    }

    #[test]
    fn test_whole_charset_translates() {
        for symbol in CharToEvdevCode::supported_charset().chars() {
            assert!(
                CharToEvdevCode::translate(symbol).is_ok(),
                "символ '{}' должен транслироваться",
                symbol
            );
        }
    }
}
