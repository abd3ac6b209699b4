//! QR v1 (21×21): служебные зоны и маршрут чтения модулей данных.
//!
//! Маршрут — парами колонок (x, x−1) справа налево, «змейкой» по y;
//! timing-колонка x=6 пропускается целиком. Служебных модулей у v1
//! ровно 233, модулей данных — 208 (26 кодвордов по 8 бит).

/// Размер сетки версии 1.
pub(crate) const N1: usize = 21;

/// Служебный ли модуль (finder с сепараторами, timing, формат, dark module).
/// Все перечисленные зоны укладываются в три угловых прямоугольника и две
/// timing-линии.
#[inline]
pub(crate) fn is_function_v1(x: usize, y: usize) -> bool {
    debug_assert!(x < N1 && y < N1);
    if (x <= 8 && y <= 8) || (x >= N1 - 8 && y <= 8) || (x <= 8 && y >= N1 - 8) {
        return true;
    }
    x == 6 || y == 6
}

/// Порядок обхода всех модулей сетки; потребитель фильтрует служебные
/// через [`is_function_v1`].
pub(crate) fn walk_pairs_v1() -> Vec<(usize, usize)> {
    let mut out = Vec::with_capacity(N1 * N1);

    let mut x: isize = (N1 as isize) - 1;
    let mut upward = true;

    while x >= 0 {
        if x == 6 {
            x -= 1;
            if x < 0 {
                break;
            }
        }
        let xx = x as usize;

        if upward {
            for y in (0..N1).rev() {
                out.push((xx, y));
                if xx > 0 {
                    out.push((xx - 1, y));
                }
            }
        } else {
            for y in 0..N1 {
                out.push((xx, y));
                if xx > 0 {
                    out.push((xx - 1, y));
                }
            }
        }

        upward = !upward;
        x -= 2;
    }

    out
}

/// Снять ровно 208 бит данных (data + EC) в порядке обхода.
pub(crate) fn extract_data_bits_v1(grid: &[bool]) -> Vec<bool> {
    debug_assert_eq!(grid.len(), N1 * N1);

    let mut bits = Vec::with_capacity(208);
    for (x, y) in walk_pairs_v1() {
        if is_function_v1(x, y) {
            continue;
        }
        bits.push(grid[y * N1 + x]);
        if bits.len() == 208 {
            break;
        }
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_and_data_module_counts() {
        let mut func = 0usize;
        for y in 0..N1 {
            for x in 0..N1 {
                if is_function_v1(x, y) {
                    func += 1;
                }
            }
        }
        assert_eq!(func, 233);
        assert_eq!(N1 * N1 - func, 208);
    }

    #[test]
    fn extraction_follows_walk_order() {
        // помечаем первые k модулей данных в порядке обхода
        let mut grid = vec![false; N1 * N1];
        let k = 40usize;
        let mut left = k;
        for (x, y) in walk_pairs_v1() {
            if is_function_v1(x, y) {
                continue;
            }
            grid[y * N1 + x] = true;
            left -= 1;
            if left == 0 {
                break;
            }
        }

        let bits = extract_data_bits_v1(&grid);
        assert_eq!(bits.len(), 208);
        for (i, b) in bits.iter().enumerate() {
            assert_eq!(*b, i < k, "бит {i}");
        }
    }

    #[test]
    fn timing_column_never_opens_a_pair() {
        for (idx, (x, _)) in walk_pairs_v1().iter().enumerate() {
            if idx % 2 == 0 {
                assert_ne!(*x, 6);
            }
        }
    }
}
