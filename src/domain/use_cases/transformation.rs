use crate::{
    entities::transformation::{
        AspectRatio, BackgroundMode, DisplayOptions, HexColor, SizeMode, TransformationDescriptor,
        MAX_DIMENSION,
    },
    errors::ParameterError,
};

/// Turns sidebar choices into the descriptor used for every rendition request.
pub struct TransformationParameterBuilder;

impl TransformationParameterBuilder {
    /// Builds a descriptor. Pure: the same options always give the same result.
    pub fn build(options: &DisplayOptions) -> Result<TransformationDescriptor, ParameterError> {
        let background_mode = effective_mode(options);

        let background_color = if background_mode.requires_fill() {
            let raw = options
                .background_color
                .as_deref()
                .ok_or_else(|| ParameterError::InvalidColor(String::new()))?;
            Some(HexColor::parse(raw)?)
        } else {
            None
        };

        let width = options.width.filter(|w| *w > 0);

        let (target_width, target_height, aspect_ratio) = match options.size_mode {
            SizeMode::Dimensions => (width, options.height.filter(|h| *h > 0), None),
            SizeMode::AspectRatio => {
                let raw = options
                    .aspect_ratio
                    .as_deref()
                    .ok_or_else(|| ParameterError::InvalidAspectRatio(String::new()))?;
                let ratio: AspectRatio = raw.parse()?;
                let height = width.map(|w| ratio.height_for(w));
                if height.is_some_and(|h| h > MAX_DIMENSION) {
                    return Err(ParameterError::InvalidAspectRatio(raw.to_string()));
                }
                (width, height, Some(ratio))
            }
        };

        Ok(TransformationDescriptor {
            target_width,
            target_height,
            aspect_ratio,
            background_mode,
            background_color,
            preserve_fine_edges: options.preserve_fine_edges && background_mode.removes_background(),
            output_format: options.output_format,
        })
    }
}

fn effective_mode(options: &DisplayOptions) -> BackgroundMode {
    if !options.remove_background && options.background_mode.removes_background() {
        BackgroundMode::Unchanged
    } else {
        options.background_mode
    }
}
