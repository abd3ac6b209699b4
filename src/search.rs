//! Стратегия поиска: перебор трансформов кадра поверх реестра декодеров.
//!
//! Порядок перебора фиксирован: исходный кадр, повороты на 90/180/270
//! (если разрешены), затем их инвертированные варианты. Полукадр
//! (downscale ×2) — запасной ярус: пробуется только для тех трансформов,
//! которые в полном разрешении ничего не дали. Паника внутри декодера
//! гасится и считается «декодер ничего не нашёл» для этого буфера.

use std::borrow::Cow;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::api::DecoderRegistry;
use crate::core::pixel::GrayBuffer;
use crate::core::types::{Candidate, FormatMask};
use crate::error::DecodeError;
use crate::options::ReaderOptions;
use crate::transform::{Rotation, Transform};

/// Минимальная сторона кадра, при которой есть смысл в полукадре.
const DOWNSCALE_MIN_DIM: usize = 64;

/// Прогнать все разрешённые трансформы и собрать сырых кандидатов.
///
/// Кандидаты идут в порядке перебора (поле `order` монотонно растёт);
/// дедупликацию и ранжирование делает агрегатор.
pub(crate) fn run_search(
    registry: &DecoderRegistry,
    base: &GrayBuffer,
    options: &ReaderOptions,
) -> Result<Vec<Candidate>, DecodeError> {
    let transforms = enumerate_transforms(options);

    // форматы, у которых вообще есть включённый декодер: как только все
    // они насыщены, без try_harder перебирать дальше нечего
    let mut servable = FormatMask::empty();
    for idx in 0..registry.len() {
        for &f in registry.get(idx).formats() {
            if options.formats.contains(f) {
                servable = servable.with(f);
            }
        }
    }

    let mut candidates: Vec<Candidate> = Vec::new();
    let mut satisfied = FormatMask::empty();
    let mut order = 0usize;
    let mut fault: Option<String> = None;
    // трансформы, не давшие ничего в полном разрешении
    let mut barren: Vec<Transform> = Vec::new();

    for tf in &transforms {
        let found = run_pass(
            registry, base, options, *tf, &mut candidates, &mut order, &mut fault,
            &mut satisfied,
        )?;
        if !found {
            barren.push(*tf);
        }
        if !options.try_harder && satisfied.contains_all(servable) {
            return Ok(candidates);
        }
    }

    // запасной ярус: полукадр для трансформов без находок
    if options.try_downscale && base.width.min(base.height) >= DOWNSCALE_MIN_DIM {
        for tf in barren {
            let half = Transform {
                downscaled: true,
                ..tf
            };
            run_pass(
                registry, base, options, half, &mut candidates, &mut order, &mut fault,
                &mut satisfied,
            )?;
            if !options.try_harder && satisfied.contains_all(servable) {
                break;
            }
        }
    }

    // сбой декодера всплывает только если больше доложить нечего
    if candidates.is_empty() {
        if let Some(msg) = fault {
            return Err(DecodeError::DecoderFault(msg));
        }
    }
    Ok(candidates)
}

/// Один проход: применить трансформ, обойти подходящие декодеры.
/// Возвращает `true`, если проход дал хотя бы одного кандидата.
/// Без try_harder декодер пропускается, когда все его включённые
/// форматы уже насыщены на предыдущих трансформах.
#[allow(clippy::too_many_arguments)]
fn run_pass(
    registry: &DecoderRegistry,
    base: &GrayBuffer,
    options: &ReaderOptions,
    tf: Transform,
    candidates: &mut Vec<Candidate>,
    order: &mut usize,
    fault: &mut Option<String>,
    satisfied: &mut FormatMask,
) -> Result<bool, DecodeError> {
    if options.should_abort() {
        return Err(DecodeError::Cancelled);
    }

    // буфер считается лениво: исходный кадр не копируем
    let mut buffer: Option<Cow<'_, GrayBuffer>> = None;
    let mut found = false;

    for idx in 0..registry.len() {
        let decoder = registry.get(idx);
        let formats = decoder.formats();
        if !formats.iter().any(|&f| options.formats.contains(f)) {
            continue;
        }
        if !options.try_harder
            && formats
                .iter()
                .filter(|&&f| options.formats.contains(f))
                .all(|&f| satisfied.contains(f))
        {
            continue;
        }
        if options.should_abort() {
            return Err(DecodeError::Cancelled);
        }

        let buf = buffer.get_or_insert_with(|| {
            if tf.is_identity() {
                Cow::Borrowed(base)
            } else {
                Cow::Owned(tf.apply(base))
            }
        });

        let hits = match catch_unwind(AssertUnwindSafe(|| decoder.try_decode(buf))) {
            Ok(hits) => hits,
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                log::warn!("декодер #{idx} паниковал на трансформе {tf}: {msg}");
                fault.get_or_insert(msg);
                continue;
            }
        };

        for hit in hits {
            if !options.formats.contains(hit.format) {
                continue;
            }
            let quad = tf.map_quad_back(hit.quad, base.width, base.height);
            *satisfied = satisfied.with(hit.format);
            candidates.push(Candidate {
                text: hit.text,
                format: hit.format,
                confidence: hit.confidence,
                quad,
                source_transform: tf,
                order: *order,
            });
            *order += 1;
            found = true;
        }
    }

    if found {
        log::debug!("поиск: трансформ {tf} дал кандидатов");
    }
    Ok(found)
}

/// Текст из payload'а паники декодера.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "decoder panicked".to_string()
    }
}

/// Фиксированный порядок трансформов полного разрешения.
fn enumerate_transforms(options: &ReaderOptions) -> Vec<Transform> {
    let rotations: &[Rotation] = if options.try_rotate {
        &[Rotation::R0, Rotation::R90, Rotation::R180, Rotation::R270]
    } else {
        &[Rotation::R0]
    };

    let mut out = Vec::with_capacity(rotations.len() * 2);
    for &rotation in rotations {
        out.push(Transform {
            rotation,
            inverted: false,
            downscaled: false,
        });
    }
    if options.try_invert {
        for &rotation in rotations {
            out.push(Transform {
                rotation,
                inverted: true,
                downscaled: false,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{DecoderHit, SymbologyDecoder};
    use crate::core::types::{FormatMask, Point, Quad, Symbology};
    use crate::options::CancelToken;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn dummy_quad() -> Quad {
        Quad {
            tl: Point::new(0, 0),
            tr: Point::new(9, 0),
            br: Point::new(9, 9),
            bl: Point::new(0, 9),
        }
    }

    struct CountingDecoder {
        calls: Arc<AtomicUsize>,
        hit: bool,
    }

    impl CountingDecoder {
        fn new(hit: bool) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                hit,
            }
        }
    }

    impl SymbologyDecoder for CountingDecoder {
        fn formats(&self) -> &'static [Symbology] {
            &[Symbology::Code128]
        }
        fn try_decode(&self, _gray: &GrayBuffer) -> Vec<DecoderHit> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if self.hit {
                vec![DecoderHit {
                    text: "X".into(),
                    format: Symbology::Code128,
                    confidence: 1.0,
                    quad: dummy_quad(),
                }]
            } else {
                Vec::new()
            }
        }
    }

    /// Находит QR только на портретном кадре: эмуляция символа,
    /// видимого лишь после поворота.
    struct PortraitOnlyDecoder;

    impl SymbologyDecoder for PortraitOnlyDecoder {
        fn formats(&self) -> &'static [Symbology] {
            &[Symbology::QrCode]
        }
        fn try_decode(&self, gray: &GrayBuffer) -> Vec<DecoderHit> {
            if gray.height > gray.width {
                vec![DecoderHit {
                    text: "Q".into(),
                    format: Symbology::QrCode,
                    confidence: 1.0,
                    quad: dummy_quad(),
                }]
            } else {
                Vec::new()
            }
        }
    }

    struct PanickyDecoder;
    impl SymbologyDecoder for PanickyDecoder {
        fn formats(&self) -> &'static [Symbology] {
            &[Symbology::Ean8]
        }
        fn try_decode(&self, _gray: &GrayBuffer) -> Vec<DecoderHit> {
            panic!("boom");
        }
    }

    fn blank(w: usize, h: usize) -> GrayBuffer {
        GrayBuffer::from_raw(vec![255u8; w * h], w, h)
    }

    #[test]
    fn transform_order_starts_with_identity() {
        let opts = ReaderOptions::new().with_try_invert(true);
        let tfs = enumerate_transforms(&opts);
        assert_eq!(tfs.len(), 8);
        assert!(tfs[0].is_identity());
        assert!(!tfs[3].inverted);
        assert!(tfs[4].inverted);
    }

    #[test]
    fn rotations_disabled_leaves_two_passes_with_invert() {
        let opts = ReaderOptions::new()
            .with_try_rotate(false)
            .with_try_invert(true);
        assert_eq!(enumerate_transforms(&opts).len(), 2);
    }

    #[test]
    fn format_mask_skips_decoder_entirely() {
        let mut reg = DecoderRegistry::empty();
        reg.register(Box::new(CountingDecoder::new(false)));
        let opts = ReaderOptions::new().with_formats(FormatMask::only(Symbology::QrCode));
        let out = run_search(&reg, &blank(100, 100), &opts).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn early_exit_without_try_harder() {
        let mut reg = DecoderRegistry::empty();
        reg.register(Box::new(CountingDecoder::new(true)));
        let opts = ReaderOptions::new().with_try_harder(false);
        let out = run_search(&reg, &blank(100, 100), &opts).unwrap();
        // единственный формат насыщен первым же проходом
        assert_eq!(out.len(), 1);
        assert!(out[0].source_transform.is_identity());
    }

    #[test]
    fn saturated_format_does_not_stop_other_formats() {
        let near = CountingDecoder::new(true);
        let calls = near.calls.clone();
        let mut reg = DecoderRegistry::empty();
        reg.register(Box::new(near));
        reg.register(Box::new(PortraitOnlyDecoder));

        // ландшафтный кадр: Code128 находится сразу, QR — только после R90
        let opts = ReaderOptions::new().with_try_harder(false);
        let out = run_search(&reg, &blank(100, 60), &opts).unwrap();

        assert!(out.iter().any(|c| c.format == Symbology::Code128));
        assert!(
            out.iter().any(|c| c.format == Symbology::QrCode),
            "второй формат добирается на повёрнутом проходе"
        );
        // насыщенный формат на последующих трансформах не перепроверяется
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn panicking_decoder_is_contained() {
        let mut reg = DecoderRegistry::empty();
        reg.register(Box::new(PanickyDecoder));
        reg.register(Box::new(CountingDecoder::new(true)));
        let opts = ReaderOptions::new().with_try_harder(false);
        let out = run_search(&reg, &blank(100, 100), &opts).unwrap();
        assert_eq!(out.len(), 1, "паника соседа не хоронит поиск");
        assert_eq!(out[0].text, "X");
    }

    #[test]
    fn lone_panicking_decoder_surfaces_fault() {
        let mut reg = DecoderRegistry::empty();
        reg.register(Box::new(PanickyDecoder));
        let opts = ReaderOptions::new();
        match run_search(&reg, &blank(100, 100), &opts) {
            Err(DecodeError::DecoderFault(msg)) => assert_eq!(msg, "boom"),
            other => panic!("ожидался DecoderFault, получено {other:?}"),
        }
    }

    #[test]
    fn cancelled_token_aborts_with_error() {
        let mut reg = DecoderRegistry::empty();
        reg.register(Box::new(CountingDecoder::new(true)));
        let token = CancelToken::new();
        token.cancel();
        let opts = ReaderOptions::new().with_cancel(token);
        assert!(matches!(
            run_search(&reg, &blank(100, 100), &opts),
            Err(DecodeError::Cancelled)
        ));
    }

    #[test]
    fn elapsed_deadline_cancels_search() {
        let mut reg = DecoderRegistry::empty();
        reg.register(Box::new(CountingDecoder::new(true)));
        let opts = ReaderOptions::new().with_deadline(std::time::Instant::now());
        assert!(matches!(
            run_search(&reg, &blank(100, 100), &opts),
            Err(DecodeError::Cancelled)
        ));
    }

    #[test]
    fn downscale_tier_only_for_barren_transforms() {
        // декодер всегда находит — полукадр не должен добавить дублей
        let mut reg = DecoderRegistry::empty();
        reg.register(Box::new(CountingDecoder::new(true)));
        let opts = ReaderOptions::new(); // try_harder=true, try_downscale=true
        let out = run_search(&reg, &blank(100, 100), &opts).unwrap();
        // 4 трансформа полного разрешения, каждый дал кандидата; полукадра нет
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|c| !c.source_transform.downscaled));
    }
}
