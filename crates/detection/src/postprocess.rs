//! YOLO output decoding and non-maximum suppression

use crate::normalizer::RawDetection;

/// Geometry of a decode pass
#[derive(Debug, Clone, Copy)]
pub(crate) struct DecodeParams {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    /// Original width / model input width
    pub scale_x: f32,
    /// Original height / model input height
    pub scale_y: f32,
    pub image_width: f32,
    pub image_height: f32,
}

/// Memory layout of a prediction tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Layout {
    /// 4 box values plus one score per class
    pub channels: usize,
    pub anchors: usize,
    /// `[1, anchors, channels]` instead of `[1, channels, anchors]`
    pub anchors_first: bool,
}

impl Layout {
    /// Infer the layout from a `[1, a, b]` output shape.
    ///
    /// Detection heads always emit far more anchors than channels.
    pub fn from_shape(shape: &[usize]) -> Option<Self> {
        match shape {
            [1, a, b] if a > b => Some(Self { channels: *b, anchors: *a, anchors_first: true }),
            [1, a, b] => Some(Self { channels: *a, anchors: *b, anchors_first: false }),
            _ => None,
        }
    }
}

/// Decode a YOLO prediction tensor.
///
/// Each anchor holds `cx, cy, w, h` in model-input pixels followed by one
/// score per class.
pub(crate) fn decode(data: &[f32], layout: Layout, params: &DecodeParams) -> Vec<RawDetection> {
    let Layout { channels, anchors, anchors_first } = layout;
    if channels <= 4 || data.len() < channels * anchors {
        return Vec::new();
    }

    let at = |c: usize, i: usize| -> f32 {
        if anchors_first {
            data[i * channels + c]
        } else {
            data[c * anchors + i]
        }
    };

    let mut candidates = Vec::new();
    for i in 0..anchors {
        let (class_id, score) = (4..channels)
            .map(|c| (c - 4, at(c, i)))
            .fold((0usize, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

        if score < params.confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (at(0, i), at(1, i), at(2, i), at(3, i));
        let x1 = ((cx - w / 2.0) * params.scale_x).clamp(0.0, params.image_width);
        let y1 = ((cy - h / 2.0) * params.scale_y).clamp(0.0, params.image_height);
        let x2 = ((cx + w / 2.0) * params.scale_x).clamp(0.0, params.image_width);
        let y2 = ((cy + h / 2.0) * params.scale_y).clamp(0.0, params.image_height);

        candidates.push(RawDetection {
            class_id: class_id as u32,
            confidence: score,
            bbox: [x1, y1, x2, y2],
        });
    }

    non_max_suppression(candidates, params.iou_threshold)
}

/// Per-class greedy NMS, highest confidence first
pub(crate) fn non_max_suppression(mut candidates: Vec<RawDetection>, iou_threshold: f32) -> Vec<RawDetection> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<RawDetection> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let suppressed = kept
            .iter()
            .any(|k| k.class_id == candidate.class_id && iou(&k.bbox, &candidate.bbox) > iou_threshold);
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let ix1 = a[0].max(b[0]);
    let iy1 = a[1].max(b[1]);
    let ix2 = a[2].min(b[2]);
    let iy2 = a[3].min(b[3]);

    let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    let union = area_a + area_b - inter;

    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}
