//! Reed–Solomon над GF(256) с примитивным полиномом 0x11D.
//!
//! Кодирование (EC-байты для синтеза) и полная коррекция одного блока:
//! синдромы → Берлекэмп–Мэсси → поиск Чиена → формула Форни.

const GF_PRIM: u16 = 0x11D;
const GF_GEN: u8 = 2;

#[inline]
fn gf_add(a: u8, b: u8) -> u8 {
    a ^ b
}

#[inline]
fn gf_mul(a: u8, b: u8) -> u8 {
    let mut aa = u16::from(a);
    let mut bb = u16::from(b);
    let mut res: u8 = 0;
    while bb != 0 {
        if (bb & 1) != 0 {
            res ^= aa as u8;
        }
        let carry = (aa & 0x80) != 0;
        aa = (aa << 1) & 0xFF;
        if carry {
            aa ^= GF_PRIM;
        }
        bb >>= 1;
    }
    res
}

#[inline]
fn gf_pow(a: u8, mut e: i32) -> u8 {
    if e == 0 {
        return 1;
    }
    if a == 0 {
        return 0;
    }
    e %= 255;
    if e < 0 {
        e += 255;
    }
    let mut base = a;
    let mut acc: u8 = 1;
    let mut exp = e as u32;
    while exp > 0 {
        if (exp & 1) != 0 {
            acc = gf_mul(acc, base);
        }
        base = gf_mul(base, base);
        exp >>= 1;
    }
    acc
}

#[inline]
fn gf_inv(a: u8) -> u8 {
    debug_assert!(a != 0);
    gf_pow(a, 254)
}

/// Коэффициенты генераторного полинома g(x) = ∏ (x − α^i) без ведущей
/// единицы, старшие степени первыми — порядок отводов LFSR в
/// [`rs_ec_bytes`].
fn generator_poly(ec_len: usize) -> Vec<u8> {
    // произведение собирается младшими степенями вперёд: g[j] — коэфф. x^j
    let mut g = vec![1u8];
    for i in 0..ec_len {
        let a = gf_pow(GF_GEN, i as i32);
        let mut ng = vec![0u8; g.len() + 1];
        for (j, &gj) in g.iter().enumerate() {
            ng[j] = gf_add(ng[j], gf_mul(gj, a));
            ng[j + 1] = gf_add(ng[j + 1], gj);
        }
        g = ng;
    }
    g.truncate(ec_len);
    g.reverse();
    g
}

/// `ec_len` байт ECC для `data` (систематический код).
pub(crate) fn rs_ec_bytes(data: &[u8], ec_len: usize) -> Vec<u8> {
    let gen = generator_poly(ec_len);
    let mut rem = vec![0u8; ec_len];
    for &d in data {
        let coef = gf_add(d, rem[0]);
        for i in 0..ec_len.saturating_sub(1) {
            rem[i] = rem[i + 1];
        }
        if ec_len > 0 {
            rem[ec_len - 1] = 0;
        }
        if coef != 0 {
            for i in 0..ec_len {
                rem[i] = gf_add(rem[i], gf_mul(coef, gen[i]));
            }
        }
    }
    rem
}

/// Исправить ошибки в блоке `data_len + ec_len` байт на месте.
/// `Some(исправлено_байт)` при успехе, `None` — блок не восстановим.
pub(crate) fn rs_correct_block(
    codewords: &mut [u8],
    data_len: usize,
    ec_len: usize,
) -> Option<usize> {
    let n = data_len + ec_len;
    if codewords.len() != n || ec_len == 0 {
        return None;
    }

    let synd = compute_syndromes(codewords, ec_len);
    if synd.iter().all(|&s| s == 0) {
        return Some(0);
    }

    let (sigma, omega) = berlekamp_massey(&synd);

    // число корней σ должно совпасть с её степенью и влезть в допуск кода
    let n_err = sigma.len() - 1;
    let err_pos = chien_search(&sigma, n);
    if err_pos.is_empty() || err_pos.len() != n_err || 2 * n_err > ec_len {
        return None;
    }

    let sigma_prime = poly_derivative(&sigma);
    let mut corrected = 0usize;
    for &pos in &err_pos {
        // локатор ошибки X = α^pos, pos — степень повреждённого члена
        let x = gf_pow(GF_GEN, pos as i32);
        let err_mag = forney_error_magnitude(&omega, &sigma_prime, x)?;
        let idx = n - 1 - pos;
        let before = codewords[idx];
        codewords[idx] = gf_add(codewords[idx], err_mag);
        if codewords[idx] != before {
            corrected += 1;
        }
    }

    let post = compute_syndromes(codewords, ec_len);
    if post.iter().any(|&s| s != 0) {
        return None;
    }
    Some(corrected)
}

fn compute_syndromes(codewords: &[u8], ec_len: usize) -> Vec<u8> {
    let n = codewords.len();
    let mut synd = vec![0u8; ec_len];
    for (k, s) in synd.iter_mut().enumerate() {
        let a_k = gf_pow(GF_GEN, k as i32);
        let mut acc = 0u8;
        for (i, &cw) in codewords.iter().enumerate() {
            acc = gf_add(acc, gf_mul(cw, gf_pow(a_k, (n - 1 - i) as i32)));
        }
        *s = acc;
    }
    synd
}

// Полиномы ниже хранятся младшими степенями вперёд: p[i] — коэфф. при x^i.

fn poly_scale(p: &[u8], s: u8) -> Vec<u8> {
    p.iter().map(|&c| gf_mul(c, s)).collect()
}

fn poly_add(a: &[u8], b: &[u8]) -> Vec<u8> {
    let n = a.len().max(b.len());
    let mut out = vec![0u8; n];
    for (i, o) in out.iter_mut().enumerate() {
        let ai = a.get(i).copied().unwrap_or(0);
        let bi = b.get(i).copied().unwrap_or(0);
        *o = gf_add(ai, bi);
    }
    trim_high_zeros(&mut out);
    out
}

fn poly_mul(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; a.len() + b.len() - 1];
    for (i, &ai) in a.iter().enumerate() {
        if ai == 0 {
            continue;
        }
        for (j, &bj) in b.iter().enumerate() {
            if bj == 0 {
                continue;
            }
            out[i + j] = gf_add(out[i + j], gf_mul(ai, bj));
        }
    }
    trim_high_zeros(&mut out);
    out
}

fn poly_derivative(p: &[u8]) -> Vec<u8> {
    if p.len() <= 1 {
        return vec![0];
    }
    let mut out = vec![0u8; p.len() - 1];
    // в характеристике 2 выживают только нечётные степени
    for i in (1..p.len()).step_by(2) {
        out[i - 1] = p[i];
    }
    trim_high_zeros(&mut out);
    out
}

fn trim_high_zeros(v: &mut Vec<u8>) {
    while v.len() > 1 && v[v.len() - 1] == 0 {
        v.pop();
    }
}

/// Возвращает (σ(x), ω(x)); σ(0) = 1.
fn berlekamp_massey(synd: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let mut c = vec![1u8];
    let mut b = vec![1u8];
    let mut l = 0usize;
    let mut m = 1usize;

    for n in 0..synd.len() {
        let mut delta = synd[n];
        for i in 1..=l {
            let ci = c.get(i).copied().unwrap_or(0);
            delta = gf_add(delta, gf_mul(ci, synd[n - i]));
        }

        if delta != 0 {
            let t = c.clone();
            // c += x^m · Δ · b
            let mut shifted = vec![0u8; m];
            shifted.extend_from_slice(&poly_scale(&b, delta));
            c = poly_add(&c, &shifted);
            if 2 * l <= n {
                l = n + 1 - l;
                b = poly_scale(&t, gf_inv(delta));
                m = 1;
            } else {
                m += 1;
            }
        } else {
            m += 1;
        }
    }

    // ω(x) = σ(x)·S(x) mod x^L
    let mut omega = poly_mul(&c, synd);
    omega.truncate(l.max(1));
    trim_high_zeros(&mut omega);

    (c, omega)
}

fn chien_search(sigma: &[u8], n: usize) -> Vec<usize> {
    let mut err_pos = Vec::new();
    for j in 0..n {
        // корень σ в X^{-1} означает ошибку при степени j
        if poly_eval(sigma, gf_inv(gf_pow(GF_GEN, j as i32))) == 0 {
            err_pos.push(j);
        }
    }
    err_pos
}

fn poly_eval(p: &[u8], x: u8) -> u8 {
    let mut y = 0u8;
    for &coef in p.iter().rev() {
        y = gf_add(gf_mul(y, x), coef);
    }
    y
}

/// Формула Форни при b=0: e = X · ω(X⁻¹) / σ′(X⁻¹).
fn forney_error_magnitude(omega: &[u8], sigma_prime: &[u8], x: u8) -> Option<u8> {
    let x_inv = gf_inv(x);
    let den = poly_eval(sigma_prime, x_inv);
    if den == 0 {
        return None;
    }
    Some(gf_mul(x, gf_mul(poly_eval(omega, x_inv), gf_inv(den))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_block(data_len: usize, ec_len: usize) -> Vec<u8> {
        let mut cw = vec![0u8; data_len + ec_len];
        for (i, b) in cw[..data_len].iter_mut().enumerate() {
            *b = (i as u8) ^ 0xA5;
        }
        let ec = rs_ec_bytes(&cw[..data_len], ec_len);
        cw[data_len..].copy_from_slice(&ec);
        cw
    }

    #[test]
    fn clean_block_needs_no_correction() {
        let mut cw = make_block(19, 7);
        assert_eq!(rs_correct_block(&mut cw, 19, 7), Some(0));
    }

    #[test]
    fn corrects_single_error() {
        let cw = make_block(19, 7);
        let mut work = cw.clone();
        work[3] ^= 0x5A;
        let fixed = rs_correct_block(&mut work, 19, 7).expect("одиночная ошибка");
        assert_eq!(fixed, 1);
        assert_eq!(work, cw);
    }

    #[test]
    fn corrects_three_errors_at_capacity() {
        // 7 EC-байт исправляют до 3 ошибок
        let cw = make_block(19, 7);
        let mut work = cw.clone();
        work[0] ^= 0x01;
        work[10] ^= 0xFF;
        work[25] ^= 0x80;
        let fixed = rs_correct_block(&mut work, 19, 7).expect("3 ошибки в допуске");
        assert_eq!(fixed, 3);
        assert_eq!(work, cw);
    }

    #[test]
    fn corrects_errors_in_ec_region() {
        let cw = make_block(19, 7);
        let mut work = cw.clone();
        work[20] ^= 0x11;
        work[24] ^= 0x77;
        let fixed = rs_correct_block(&mut work, 19, 7).expect("ошибки в EC-хвосте");
        assert_eq!(fixed, 2);
        assert_eq!(work, cw);
    }

    #[test]
    fn rejects_overwhelming_damage() {
        let cw = make_block(9, 17);
        let mut work = cw;
        for b in work.iter_mut() {
            *b ^= 0x3C;
        }
        assert!(rs_correct_block(&mut work, 9, 17).is_none());
    }
}
