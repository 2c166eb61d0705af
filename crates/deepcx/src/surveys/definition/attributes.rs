use crate::surveys::domain::AttributeId;

/// Upper bound on attributes bound to one survey.
pub const MAX_SURVEY_ATTRIBUTES: usize = 5;

/// Append `id` when absent and below `limit`; otherwise return the selection unchanged.
pub fn add_attribute(selected: &[AttributeId], id: &AttributeId, limit: usize) -> Vec<AttributeId> {
    let mut next = selected.to_vec();
    if !selected.contains(id) && selected.len() < limit {
        next.push(id.clone());
    }
    next
}

pub fn remove_attribute(selected: &[AttributeId], id: &AttributeId) -> Vec<AttributeId> {
    selected
        .iter()
        .filter(|candidate| *candidate != id)
        .cloned()
        .collect()
}
