//! Бинаризация строки и измерение ширин баров для 1D-декодеров.
//!
//! Два порога:
//! - глобальный (смесь среднего и середины min/max) — быстрый, без аллокаций;
//! - адаптивный по скользящему среднему — терпит неравномерную засветку.
//!
//! Run-lengths здесь дополнены пиксельными стартами ([`RunLengths`]),
//! чтобы декодеры могли отдавать пиксельный охват символа для quad'а.

/// Глобальный порог строки: среднее между mean и серединой min/max.
#[inline]
#[must_use]
pub fn global_threshold(row: &[u8]) -> u8 {
    let (mut min_v, mut max_v) = (u8::MAX, 0u8);
    let mut sum: u64 = 0;
    for &v in row {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
        sum += u64::from(v);
    }
    let mean = (sum / row.len().max(1) as u64) as u16;
    let mid = (u16::from(min_v) + u16::from(max_v)) / 2;
    ((mean + mid) / 2) as u8
}

/// Глобальная бинаризация: true = чёрный.
#[must_use]
pub fn binarize_row(row: &[u8]) -> Vec<bool> {
    let t = global_threshold(row);
    row.iter().map(|&v| v < t).collect()
}

/// Адаптивная бинаризация по скользящему среднему с небольшим смещением
/// в сторону чёрного. Окно ~width/32, зажатое в [8..64].
#[must_use]
pub fn binarize_row_adaptive(row: &[u8]) -> Vec<bool> {
    let n = row.len();
    if n == 0 {
        return Vec::new();
    }
    let win = (n / 32).clamp(8, 64);
    let bias: i32 = 5;

    // префиксные суммы для среднего по окну
    let mut pref: Vec<u32> = Vec::with_capacity(n + 1);
    pref.push(0);
    for &v in row {
        let last = *pref.last().unwrap();
        pref.push(last + u32::from(v));
    }

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let left = i.saturating_sub(win);
        let right = (i + win).min(n - 1);
        let len = (right - left + 1) as u32;
        let mean = ((pref[right + 1] - pref[left]) / len) as i32;
        out.push(i32::from(row[i]) < mean - bias);
    }
    out
}

/// Последовательность ширин баров с привязкой к пикселям строки.
#[derive(Clone, Debug, Default)]
pub struct RunLengths {
    /// Ширины run'ов слева направо.
    pub widths: Vec<usize>,
    /// Пиксельный старт каждого run'а; `starts[i] + widths[i]` — его конец.
    pub starts: Vec<usize>,
    /// Цвет нулевого run'а (true = чёрный).
    pub first_is_black: bool,
}

impl RunLengths {
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.widths.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    /// Цвет run'а `i` (true = чёрный).
    #[inline]
    #[must_use]
    pub fn is_black(&self, i: usize) -> bool {
        (i % 2 == 0) == self.first_is_black
    }

    /// Пиксельный конец run'а `i` (эксклюзивный).
    #[inline]
    #[must_use]
    pub fn end(&self, i: usize) -> usize {
        self.starts[i] + self.widths[i]
    }
}

/// Разбить бинарную строку на run'ы.
#[must_use]
pub fn runs(row_bin: &[bool]) -> RunLengths {
    if row_bin.is_empty() {
        return RunLengths::default();
    }
    let mut rl = RunLengths {
        widths: Vec::new(),
        starts: Vec::new(),
        first_is_black: row_bin[0],
    };
    let mut cur = row_bin[0];
    let mut start = 0usize;
    for (i, &b) in row_bin.iter().enumerate().skip(1) {
        if b != cur {
            rl.widths.push(i - start);
            rl.starts.push(start);
            cur = b;
            start = i;
        }
    }
    rl.widths.push(row_bin.len() - start);
    rl.starts.push(start);
    rl
}

/// Нормализовать ширины к «модулям» (условная ширина 1..4).
/// База модуля — нижний квартиль ширин (устойчиво к широким quiet-зонам).
#[must_use]
pub fn normalize_modules(rl: &RunLengths) -> Vec<u8> {
    if rl.is_empty() {
        return Vec::new();
    }
    let mut sorted = rl.widths.clone();
    sorted.sort_unstable();
    let base = sorted[sorted.len() / 4].max(1);
    rl.widths
        .iter()
        .map(|&w| ((w + base / 2) / base).clamp(1, 4) as u8)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_track_starts_and_colors() {
        // 3 белых, 2 чёрных, 4 белых
        let bin = [false, false, false, true, true, false, false, false, false];
        let rl = runs(&bin);
        assert_eq!(rl.widths, vec![3, 2, 4]);
        assert_eq!(rl.starts, vec![0, 3, 5]);
        assert!(!rl.first_is_black);
        assert!(rl.is_black(1));
        assert_eq!(rl.end(1), 5);
    }

    #[test]
    fn binarize_clean_bars() {
        let mut row = vec![255u8; 30];
        for v in &mut row[10..16] {
            *v = 0;
        }
        let bin = binarize_row(&row);
        assert!(bin[12]);
        assert!(!bin[5]);
    }

    #[test]
    fn adaptive_handles_gradient() {
        // Градиентный фон + тёмные бары: глобальный порог тут капризен,
        // адаптивный обязан увидеть оба бара.
        let n = 256usize;
        let mut row: Vec<u8> = (0..n).map(|i| 100 + (i * 120 / n) as u8).collect();
        for v in &mut row[40..48] {
            *v = 20;
        }
        for v in &mut row[200..208] {
            *v = 90;
        }
        let bin = binarize_row_adaptive(&row);
        assert!(bin[44], "тёмный бар в начале градиента");
        assert!(bin[204], "тёмный бар в конце градиента");
    }

    #[test]
    fn normalize_clamps_to_four() {
        let bin: Vec<bool> = std::iter::repeat(false)
            .take(9)
            .chain(std::iter::repeat(true).take(2))
            .chain(std::iter::repeat(false).take(2))
            .chain(std::iter::repeat(true).take(4))
            .collect();
        let rl = runs(&bin);
        let m = normalize_modules(&rl);
        assert_eq!(m, vec![4, 1, 1, 2]);
    }
}
