mod depth;
mod sentence;
mod voice;

pub use depth::{rendered_word_count, transform_depth, DepthLevel};
pub use voice::{transform_voice, Voice};

use crate::content::ContentItem;
use crate::registry::TargetMapping;

/// Adapt one canonical content item for one destination: depth first, then
/// voice. Pure; the source item is never mutated.
pub fn adapt(item: &ContentItem, mapping: &TargetMapping) -> String {
    let condensed = transform_depth(&item.content, mapping.target_depth);
    transform_voice(&condensed, mapping.target_voice, None, item.content_type)
}
