//! Агрегация кандидатов: дедупликация и ранжирование.
//!
//! Один и тот же физический символ обычно находится на нескольких
//! трансформах (исходник, повороты, полукадр). Дубликатом считается
//! кандидат с тем же текстом и форматом, чей охватывающий прямоугольник
//! пересекается с уже принятым (IoU ≥ 0.5). Из дубликатов выживает
//! кандидат с наибольшей уверенностью; при равенстве предпочитается
//! исходный кадр, затем более ранний по порядку перебора.

use crate::core::types::{Candidate, DecodeResult, Quad};

const IOU_THRESHOLD: f32 = 0.5;

/// Первый кандидат с непустым текстом в порядке перебора, как его
/// видел одиночный decode.
pub(crate) fn first_match(candidates: &[Candidate]) -> Option<DecodeResult> {
    candidates
        .iter()
        .find(|c| !c.text.is_empty())
        .map(DecodeResult::from_candidate)
}

/// Дедуплицировать и отранжировать: уверенность по убыванию, при
/// равенстве — порядок обнаружения.
pub(crate) fn aggregate_all(candidates: Vec<Candidate>) -> Vec<DecodeResult> {
    let mut kept: Vec<Candidate> = Vec::new();

    for cand in candidates {
        let dup = kept.iter_mut().find(|k| {
            k.text == cand.text
                && k.format == cand.format
                && bbox_iou(&k.quad, &cand.quad) >= IOU_THRESHOLD
        });
        match dup {
            Some(k) => {
                if prefer(&cand, k) {
                    *k = cand;
                }
            }
            None => kept.push(cand),
        }
    }

    kept.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.order.cmp(&b.order))
    });

    kept.iter().map(DecodeResult::from_candidate).collect()
}

/// `a` лучше уже принятого `b`?
fn prefer(a: &Candidate, b: &Candidate) -> bool {
    if (a.confidence - b.confidence).abs() > f32::EPSILON {
        return a.confidence > b.confidence;
    }
    match (
        a.source_transform.is_identity(),
        b.source_transform.is_identity(),
    ) {
        (true, false) => true,
        (false, true) => false,
        _ => a.order < b.order,
    }
}

/// IoU осевых охватывающих прямоугольников (границы инклюзивные).
fn bbox_iou(a: &Quad, b: &Quad) -> f32 {
    let (ax0, ay0, ax1, ay1) = a.bounding_box();
    let (bx0, by0, bx1, by1) = b.bounding_box();

    let ix = (ax1.min(bx1) - ax0.max(bx0) + 1).max(0) as f32;
    let iy = (ay1.min(by1) - ay0.max(by0) + 1).max(0) as f32;
    let inter = ix * iy;

    let area_a = ((ax1 - ax0 + 1).max(0) as f32) * ((ay1 - ay0 + 1).max(0) as f32);
    let area_b = ((bx1 - bx0 + 1).max(0) as f32) * ((by1 - by0 + 1).max(0) as f32);
    let union = area_a + area_b - inter;
    if union <= 0.0 {
        return 0.0;
    }
    inter / union
}
