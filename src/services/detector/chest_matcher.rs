use crate::error::{BongoError, Result};
use crate::events::ChestMatch;
use image::{GrayImage, RgbaImage};
use imageproc::template_matching::{find_extremes, match_template, MatchTemplateMethod};
use std::path::Path;
use tracing::{debug, info};

/// Поиск иконки сундука на снимке экрана нормированной кросс-корреляцией.
pub struct ChestMatcher {
    template: GrayImage,
}

impl ChestMatcher {
    /// Загрузить шаблон сундука из файла
    pub fn new<P: AsRef<Path>>(template_path: P) -> Result<Self> {
        let template_path = template_path.as_ref();

        if !template_path.exists() {
            return Err(BongoError::Internal(format!(
                "Шаблон сундука не найден: {:?}",
                template_path
            )));
        }

        let template = image::open(template_path)?.to_luma8();
        info!(
            "Шаблон сундука загружен: {:?} ({}x{})",
            template_path,
            template.width(),
            template.height()
        );

        Ok(Self { template })
    }

    /// Собрать matcher из готового шаблона (dry-run и тесты)
    pub fn from_template(template: GrayImage) -> Self {
        Self { template }
    }

    /// Найти лучшее совпадение шаблона на снимке
    pub fn locate(&self, screen: &RgbaImage) -> Result<ChestMatch> {
        let (tw, th) = (self.template.width(), self.template.height());

        if screen.width() < tw || screen.height() < th {
            return Err(BongoError::Internal(format!(
                "Снимок {}x{} меньше шаблона {}x{}",
                screen.width(),
                screen.height(),
                tw,
                th
            )));
        }

        // Сопоставление выполняется в градациях серого
        let screen_gray: GrayImage = image::imageops::grayscale(screen);

        let scores = match_template(
            &screen_gray,
            &self.template,
            MatchTemplateMethod::CrossCorrelationNormalized,
        );
        let extremes = find_extremes(&scores);

        let confidence = f64::from(extremes.max_value).clamp(0.0, 1.0);
        let (x, y) = extremes.max_value_location;

        debug!(
            "Лучшее совпадение шаблона: уверенность {:.4} в ({}, {})",
            confidence, x, y
        );

        Ok(ChestMatch {
            confidence,
            top_left: (x, y),
            center: (x + tw / 2, y + th / 2),
        })
    }
}
