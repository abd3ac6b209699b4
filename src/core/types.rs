// src/core/types.rs
//
// Общие типы результата: геометрия, символики, маска форматов,
// сырой кандидат и финальный DecodeResult.

use std::fmt;

use crate::transform::Transform;

/// Точка в пиксельных координатах исходного изображения.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[inline]
    #[must_use]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Четырёхугольник символа: углы по часовой стрелке, начиная с верхнего левого
/// (top-left, top-right, bottom-right, bottom-left).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Quad {
    pub tl: Point,
    pub tr: Point,
    pub br: Point,
    pub bl: Point,
}

impl Quad {
    /// Осевой охватывающий прямоугольник: (x_min, y_min, x_max, y_max).
    #[must_use]
    pub fn bounding_box(&self) -> (i32, i32, i32, i32) {
        let xs = [self.tl.x, self.tr.x, self.br.x, self.bl.x];
        let ys = [self.tl.y, self.tr.y, self.br.y, self.bl.y];
        let x0 = xs.iter().copied().min().unwrap_or(0);
        let x1 = xs.iter().copied().max().unwrap_or(0);
        let y0 = ys.iter().copied().min().unwrap_or(0);
        let y1 = ys.iter().copied().max().unwrap_or(0);
        (x0, y0, x1, y1)
    }
}

/// Поддерживаемые (распознаваемые маской) символики.
///
/// Порядок перечисления фиксирован — он же порядок перебора форматов
/// в стратегии поиска и порядок итерации [`FormatMask`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Symbology {
    QrCode,
    DataMatrix,
    Code128,
    Ean13,
    Ean8,
    UpcA,
}

impl Symbology {
    /// Все известные символики в фиксированном порядке перебора.
    pub const ALL: [Symbology; 6] = [
        Symbology::QrCode,
        Symbology::DataMatrix,
        Symbology::Code128,
        Symbology::Ean13,
        Symbology::Ean8,
        Symbology::UpcA,
    ];

    #[inline]
    fn bit(self) -> u16 {
        match self {
            Symbology::QrCode => 1 << 0,
            Symbology::DataMatrix => 1 << 1,
            Symbology::Code128 => 1 << 2,
            Symbology::Ean13 => 1 << 3,
            Symbology::Ean8 => 1 << 4,
            Symbology::UpcA => 1 << 5,
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Symbology::QrCode => "QR Code",
            Symbology::DataMatrix => "Data Matrix",
            Symbology::Code128 => "Code 128",
            Symbology::Ean13 => "EAN-13",
            Symbology::Ean8 => "EAN-8",
            Symbology::UpcA => "UPC-A",
        };
        f.write_str(s)
    }
}

/// Набор символик, которые пробует стратегия поиска.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FormatMask(u16);

impl FormatMask {
    /// Все известные форматы (дефолт опций).
    #[must_use]
    pub fn all() -> Self {
        let mut bits = 0u16;
        for s in Symbology::ALL {
            bits |= s.bit();
        }
        Self(bits)
    }

    /// Пустая маска (ни одного формата; поиск сразу даст «не найдено»).
    #[must_use]
    pub fn empty() -> Self {
        Self(0)
    }

    /// Маска из одного формата.
    #[must_use]
    pub fn only(s: Symbology) -> Self {
        Self(s.bit())
    }

    #[must_use]
    pub fn with(mut self, s: Symbology) -> Self {
        self.0 |= s.bit();
        self
    }

    #[must_use]
    pub fn without(mut self, s: Symbology) -> Self {
        self.0 &= !s.bit();
        self
    }

    #[inline]
    #[must_use]
    pub fn contains(self, s: Symbology) -> bool {
        self.0 & s.bit() != 0
    }

    #[inline]
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Входят ли все форматы `other` в эту маску.
    #[inline]
    #[must_use]
    pub fn contains_all(self, other: FormatMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// Форматы маски в фиксированном порядке перебора.
    pub fn iter(self) -> impl Iterator<Item = Symbology> {
        Symbology::ALL.into_iter().filter(move |s| self.contains(*s))
    }
}

impl Default for FormatMask {
    fn default() -> Self {
        Self::all()
    }
}

/// Сырой кандидат от одного вызова декодера на одном трансформе.
/// Координаты `quad` уже отображены обратно в систему исходного изображения.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub text: String,
    pub format: Symbology,
    pub confidence: f32,
    pub quad: Quad,
    /// Какой проход (поворот/инверсия/даунскейл) дал этот кандидат.
    pub source_transform: Transform,
    /// Сквозной индекс в порядке перечисления transform × format.
    pub order: usize,
}

/// Финальный результат для вызывающей стороны.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodeResult {
    pub text: String,
    pub format: Symbology,
    pub confidence: f32,
    pub quad: Quad,
}

impl DecodeResult {
    pub(crate) fn from_candidate(c: &Candidate) -> Self {
        Self {
            text: c.text.clone(),
            format: c.format,
            confidence: c.confidence,
            quad: c.quad,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_all_contains_each_symbology() {
        let m = FormatMask::all();
        for s in Symbology::ALL {
            assert!(m.contains(s), "{s} отсутствует в полной маске");
        }
    }

    #[test]
    fn mask_only_and_without() {
        let m = FormatMask::only(Symbology::Ean13);
        assert!(m.contains(Symbology::Ean13));
        assert!(!m.contains(Symbology::QrCode));
        assert!(m.without(Symbology::Ean13).is_empty());
    }

    #[test]
    fn mask_contains_all_is_subset_check() {
        let pair = FormatMask::only(Symbology::QrCode).with(Symbology::Code128);
        assert!(FormatMask::all().contains_all(pair));
        assert!(pair.contains_all(FormatMask::only(Symbology::QrCode)));
        assert!(pair.contains_all(FormatMask::empty()));
        assert!(!FormatMask::only(Symbology::QrCode).contains_all(pair));
    }

    #[test]
    fn mask_iter_keeps_enum_order() {
        let m = FormatMask::only(Symbology::UpcA).with(Symbology::QrCode);
        let order: Vec<_> = m.iter().collect();
        assert_eq!(order, vec![Symbology::QrCode, Symbology::UpcA]);
    }

    #[test]
    fn quad_bounding_box() {
        let q = Quad {
            tl: Point::new(10, 5),
            tr: Point::new(40, 6),
            br: Point::new(41, 30),
            bl: Point::new(9, 29),
        };
        assert_eq!(q.bounding_box(), (9, 5, 41, 30));
    }
}
