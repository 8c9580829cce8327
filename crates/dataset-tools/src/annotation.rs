//! Source annotation format and YOLO label lines

use detection::ObjectClass;
use serde::{Deserialize, Serialize};

/// One annotation JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotationFile {
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// One labeled box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Image file name, relative to the image directory
    pub filename: String,
    /// 1-based class number
    pub class: u32,
    /// `[x, y, width, height]` in pixels, top-left origin
    pub bbox: [f64; 4],
}

impl Annotation {
    /// Zero-based detector class, if the class number is in the table
    pub fn class_id(&self) -> Option<u32> {
        self.class
            .checked_sub(1)
            .filter(|id| ObjectClass::from_id(*id).is_some())
    }

    /// YOLO line `cls cx cy w h`, normalized by the image size
    pub fn to_yolo_line(&self, image_width: u32, image_height: u32) -> Option<String> {
        let class_id = self.class_id()?;
        if image_width == 0 || image_height == 0 {
            return None;
        }

        let (iw, ih) = (f64::from(image_width), f64::from(image_height));
        let [x, y, w, h] = self.bbox;
        let cx = (x + w / 2.0) / iw;
        let cy = (y + h / 2.0) / ih;

        Some(format!("{} {:.6} {:.6} {:.6} {:.6}", class_id, cx, cy, w / iw, h / ih))
    }
}
