//! Формат-инфо QR v1: BCH(15,5), маска слова 0x5412, дорожки чтения,
//! формулы масок данных.

/// Уровень коррекции ошибок.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EcLevel {
    L,
    M,
    Q,
    H,
}

impl EcLevel {
    /// Два бита уровня по стандарту: L=01, M=00, Q=11, H=10.
    #[inline]
    fn to_bits2(self) -> u16 {
        match self {
            EcLevel::L => 0b01,
            EcLevel::M => 0b00,
            EcLevel::Q => 0b11,
            EcLevel::H => 0b10,
        }
    }

    /// Структура единственного RS-блока v1: (data_len, ec_len).
    #[inline]
    #[must_use]
    pub fn block_v1(self) -> (usize, usize) {
        match self {
            EcLevel::L => (19, 7),
            EcLevel::M => (16, 10),
            EcLevel::Q => (13, 13),
            EcLevel::H => (9, 17),
        }
    }

    /// Максимум байт полезной нагрузки в Byte mode для v1.
    #[inline]
    #[must_use]
    pub fn byte_capacity_v1(self) -> usize {
        match self {
            EcLevel::L => 17,
            EcLevel::M => 14,
            EcLevel::Q => 11,
            EcLevel::H => 7,
        }
    }
}

/// Генератор BCH(15,5): x^10 + x^8 + x^5 + x^4 + x^2 + x + 1.
const BCH15_5_GEN: u16 = 0x537;
/// Маска слова формата из стандарта.
const FORMAT_MASK: u16 = 0x5412;

fn bch_remainder_15_5(mut v: u16) -> u16 {
    for shift in (10..=14).rev() {
        if (v >> shift) & 1 == 1 {
            v ^= BCH15_5_GEN << (shift - 10);
        }
    }
    v & 0x03FF
}

/// Финальное (замаскированное) 15-битное слово формата.
pub(crate) fn encode_format_word(ec: EcLevel, mask_id: u8) -> u16 {
    let payload = ((ec.to_bits2() << 3) | (u16::from(mask_id) & 0x7)) << 10;
    (payload | bch_remainder_15_5(payload)) ^ FORMAT_MASK
}

#[inline]
fn hamming15(a: u16, b: u16) -> u32 {
    (a ^ b).count_ones()
}

/// Декодировать слово формата перебором всех 32 валидных слов.
/// `Some((уровень, id маски, расстояние))` при расстоянии ≤ 3.
pub(crate) fn decode_format_word(word: u16) -> Option<(EcLevel, u8, u32)> {
    const LEVELS: [EcLevel; 4] = [EcLevel::L, EcLevel::M, EcLevel::Q, EcLevel::H];

    let mut best: Option<(EcLevel, u8, u32)> = None;
    for &ec in &LEVELS {
        for mask in 0u8..8 {
            let d = hamming15(word, encode_format_word(ec, mask));
            if best.map_or(true, |(_, _, bd)| d < bd) {
                best = Some((ec, mask, d));
            }
        }
    }
    best.filter(|&(_, _, d)| d <= 3)
}

/// Координаты (x, y) двух копий 15-битного формата для v1 (21×21).
/// Бит 14 (MSB) читается первым.
pub(crate) const FORMAT_READ_PATHS_V1: [[(usize, usize); 15]; 2] = [
    // вокруг верхне-левого finder'а: строка y=8 слева направо, затем
    // столбец x=8 снизу вверх; timing-модули (6,8) и (8,6) пропускаются
    [
        (0, 8),
        (1, 8),
        (2, 8),
        (3, 8),
        (4, 8),
        (5, 8),
        (7, 8),
        (8, 8),
        (8, 7),
        (8, 5),
        (8, 4),
        (8, 3),
        (8, 2),
        (8, 1),
        (8, 0),
    ],
    // зеркальная копия: столбец x=8 снизу вверх (над dark module),
    // затем строка y=8 от правого сепаратора к краю
    [
        (8, 20),
        (8, 19),
        (8, 18),
        (8, 17),
        (8, 16),
        (8, 15),
        (8, 14),
        (13, 8),
        (14, 8),
        (15, 8),
        (16, 8),
        (17, 8),
        (18, 8),
        (19, 8),
        (20, 8),
    ],
];

/// Маска данных `mask_id` накрывает модуль (x, y)?
#[inline]
pub(crate) fn mask_hit(mask_id: u8, x: usize, y: usize) -> bool {
    let x = x as i32;
    let y = y as i32;
    match mask_id {
        0 => (x + y) % 2 == 0,
        1 => y % 2 == 0,
        2 => x % 3 == 0,
        3 => (x + y) % 3 == 0,
        4 => ((y / 2) + (x / 3)) % 2 == 0,
        5 => (x * y) % 2 + (x * y) % 3 == 0,
        6 => ((x * y) % 2 + (x * y) % 3) % 2 == 0,
        7 => ((x + y) % 2 + (x * y) % 3) % 2 == 0,
        _ => false,
    }
}
