use crate::data_types::{
    api_data_types::ApiSelection, ModifierGroup, SelectedModifierTypes, SelectedOption,
};

/// In-progress option choices for the product currently being configured.
///
/// Groups with no selected option are never kept around, and a single-select
/// group holds at most one option.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModifierSelection {
    selected: Vec<SelectedModifierTypes>,
    validation_error: Option<String>,
}

impl ModifierSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selections(&self) -> &[SelectedModifierTypes] {
        &self.selected
    }

    /// Group that failed validation on the last submission attempt.
    pub fn validation_error(&self) -> Option<&str> {
        self.validation_error.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    fn group(&self, group_id: &str) -> Option<&SelectedModifierTypes> {
        self.selected.iter().find(|g| g.group_id == group_id)
    }

    pub fn is_selected(&self, group_id: &str, option_id: &str) -> bool {
        self.quantity_of(group_id, option_id) > 0
    }

    pub fn quantity_of(&self, group_id: &str, option_id: &str) -> u32 {
        self.group(group_id)
            .and_then(|g| g.options.iter().find(|o| o.option_id == option_id))
            .map_or(0, |o| o.quantity)
    }

    pub fn select_option(
        &mut self,
        group_id: &str,
        option_id: &str,
        is_currently_selected: bool,
        is_single_select: bool,
    ) {
        self.validation_error = None;

        if is_currently_selected {
            self.remove_option(group_id, option_id);
            return;
        }

        let picked = SelectedOption {
            option_id: option_id.to_string(),
            quantity: 1,
        };

        match self.selected.iter_mut().find(|g| g.group_id == group_id) {
            Some(entry) if is_single_select => entry.options = vec![picked],
            Some(entry) => entry.options.push(picked),
            None => self.selected.push(SelectedModifierTypes {
                group_id: group_id.to_string(),
                options: vec![picked],
            }),
        }
    }

    pub fn change_option_quantity(&mut self, group_id: &str, option_id: &str, new_quantity: u32) {
        self.validation_error = None;

        if new_quantity == 0 {
            self.remove_option(group_id, option_id);
            return;
        }

        if let Some(selected) = self
            .selected
            .iter_mut()
            .filter(|g| g.group_id == group_id)
            .flat_map(|g| g.options.iter_mut())
            .find(|o| o.option_id == option_id)
        {
            selected.quantity = new_quantity;
        }
    }

    fn remove_option(&mut self, group_id: &str, option_id: &str) {
        if let Some(entry) = self.selected.iter_mut().find(|g| g.group_id == group_id) {
            entry.options.retain(|o| o.option_id != option_id);
        }
        self.selected.retain(|g| !g.options.is_empty());
    }

    /// Tap on an option: flips it, deriving radio/checkbox behaviour from the group.
    pub fn toggle(&mut self, group: &ModifierGroup, option_id: &str) {
        let is_selected = self.is_selected(&group.id, option_id);
        let is_single = group.is_single_select();

        if !is_selected && !is_single {
            let taken = self.group(&group.id).map_or(0, |g| g.options.len());
            if taken >= group.quantity as usize {
                log::debug!(
                    "Group {} already has {} of {} options",
                    group.id,
                    taken,
                    group.quantity
                );
                return;
            }
        }

        self.select_option(&group.id, option_id, is_selected, is_single);
    }

    /// Stepper on an option, bounded by the option's `max_quantity`. 0 removes.
    pub fn change_option_quantity_clamped(
        &mut self,
        group: &ModifierGroup,
        option_id: &str,
        new_quantity: u32,
    ) {
        let max = group.option(option_id).map_or(1, |o| o.max_quantity.max(1));
        self.change_option_quantity(&group.id, option_id, new_quantity.min(max));
    }

    /// Records the group the server rejected.
    pub fn mark_invalid(&mut self, group_id: &str) {
        self.validation_error = Some(group_id.to_string());
    }

    /// First required group without a selection, which is also marked invalid.
    pub fn validate_required(&mut self, groups: &[ModifierGroup]) -> Option<String> {
        let missing = groups
            .iter()
            .find(|g| g.required && self.group(&g.id).is_none())
            .map(|g| g.id.clone());

        if let Some(group_id) = &missing {
            self.mark_invalid(group_id);
        }

        missing
    }

    pub fn price_delta(&self, groups: &[ModifierGroup]) -> f64 {
        self.selected
            .iter()
            .filter_map(|sel| {
                groups
                    .iter()
                    .find(|g| g.id == sel.group_id)
                    .map(|g| (g, sel))
            })
            .flat_map(|(group, sel)| {
                sel.options.iter().filter_map(move |o| {
                    group
                        .option(&o.option_id)
                        .map(|item| item.price * f64::from(o.quantity))
                })
            })
            .sum()
    }

    /// Flat `selections` list for the cart-item request.
    pub fn flatten(&self) -> Vec<ApiSelection> {
        self.selected
            .iter()
            .flat_map(|g| {
                g.options.iter().map(|o| ApiSelection {
                    modifier_group_id: g.group_id.clone(),
                    modifier_item_id: o.option_id.clone(),
                    quantity: o.quantity,
                })
            })
            .collect()
    }

    pub fn reset(&mut self) {
        self.selected.clear();
        self.validation_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::ModifierItem;

    fn group(id: &str, quantity: u32, required: bool) -> ModifierGroup {
        ModifierGroup {
            id: id.to_string(),
            name: id.to_string(),
            required,
            quantity,
            options: ["a", "b", "c"]
                .iter()
                .enumerate()
                .map(|(i, o)| ModifierItem {
                    id: o.to_string(),
                    name: o.to_uppercase(),
                    price: i as f64,
                    max_quantity: 3,
                })
                .collect(),
        }
    }

    #[test]
    fn test_single_select_replaces() {
        let mut sel = ModifierSelection::new();
        sel.select_option("rice", "white", false, true);
        sel.select_option("rice", "brown", false, true);

        assert_eq!(sel.selections().len(), 1);
        assert_eq!(
            sel.selections()[0].options,
            vec![SelectedOption {
                option_id: "brown".to_string(),
                quantity: 1
            }]
        );
    }

    #[test]
    fn test_single_select_never_exceeds_one() {
        let rice = group("rice", 1, true);
        let mut sel = ModifierSelection::new();
        for option_id in ["a", "b", "a", "c", "c", "b", "a"] {
            sel.toggle(&rice, option_id);
            let len = sel.group("rice").map_or(0, |g| g.options.len());
            assert!(len <= 1);
        }
    }

    #[test]
    fn test_multi_select_appends() {
        let mut sel = ModifierSelection::new();
        sel.select_option("extras", "a", false, false);
        sel.select_option("extras", "b", false, false);

        assert_eq!(sel.quantity_of("extras", "a"), 1);
        assert_eq!(sel.quantity_of("extras", "b"), 1);
        assert_eq!(sel.selections()[0].options.len(), 2);
    }

    #[test]
    fn test_deselect_drops_empty_group() {
        let mut sel = ModifierSelection::new();
        sel.select_option("extras", "a", false, false);
        sel.select_option("extras", "a", true, false);

        assert!(sel.is_empty());
    }

    #[test]
    fn test_quantity_zero_is_deselect() {
        let mut by_quantity = ModifierSelection::new();
        by_quantity.select_option("extras", "a", false, false);
        by_quantity.select_option("extras", "b", false, false);
        let mut by_toggle = by_quantity.clone();

        by_quantity.change_option_quantity("extras", "a", 0);
        by_toggle.select_option("extras", "a", true, false);
        assert_eq!(by_quantity, by_toggle);

        by_quantity.change_option_quantity("extras", "b", 0);
        assert!(by_quantity.is_empty());
    }

    #[test]
    fn test_change_quantity_in_place() {
        let mut sel = ModifierSelection::new();
        sel.select_option("extras", "a", false, false);
        sel.select_option("extras", "b", false, false);
        sel.change_option_quantity("extras", "a", 3);

        assert_eq!(sel.quantity_of("extras", "a"), 3);
        assert_eq!(sel.selections()[0].options[0].option_id, "a");
    }

    #[test]
    fn test_interaction_clears_validation_error() {
        let mut sel = ModifierSelection::new();
        sel.mark_invalid("rice");
        assert_eq!(sel.validation_error(), Some("rice"));

        sel.select_option("extras", "a", false, false);
        assert_eq!(sel.validation_error(), None);

        sel.mark_invalid("rice");
        sel.change_option_quantity("extras", "a", 2);
        assert_eq!(sel.validation_error(), None);
    }

    #[test]
    fn test_toggle_respects_group_quantity() {
        let extras = group("extras", 2, false);
        let mut sel = ModifierSelection::new();
        sel.toggle(&extras, "a");
        sel.toggle(&extras, "b");
        sel.toggle(&extras, "c");

        assert!(!sel.is_selected("extras", "c"));

        sel.toggle(&extras, "a");
        sel.toggle(&extras, "c");
        assert!(sel.is_selected("extras", "c"));
        assert!(!sel.is_selected("extras", "a"));
    }

    #[test]
    fn test_clamped_quantity() {
        let extras = group("extras", 3, false);
        let mut sel = ModifierSelection::new();
        sel.toggle(&extras, "b");
        sel.change_option_quantity_clamped(&extras, "b", 10);

        assert_eq!(sel.quantity_of("extras", "b"), 3);
    }

    #[test]
    fn test_validate_required() {
        let groups = vec![group("extras", 3, false), group("rice", 1, true)];
        let mut sel = ModifierSelection::new();

        assert_eq!(sel.validate_required(&groups).as_deref(), Some("rice"));
        assert_eq!(sel.validation_error(), Some("rice"));

        sel.toggle(&groups[1], "a");
        assert_eq!(sel.validate_required(&groups), None);
    }

    #[test]
    fn test_price_delta_and_flatten() {
        let groups = vec![group("rice", 1, true), group("extras", 3, false)];
        let mut sel = ModifierSelection::new();
        sel.toggle(&groups[0], "b");
        sel.toggle(&groups[1], "c");
        sel.change_option_quantity("extras", "c", 2);

        // b costs 1.0, c costs 2.0 x 2
        assert_eq!(sel.price_delta(&groups), 5.0);

        let flat = sel.flatten();
        assert_eq!(flat.len(), 2);
        assert_eq!(flat[1].modifier_group_id, "extras");
        assert_eq!(flat[1].modifier_item_id, "c");
        assert_eq!(flat[1].quantity, 2);
    }

    #[test]
    fn test_reset() {
        let mut sel = ModifierSelection::new();
        sel.select_option("rice", "a", false, true);
        sel.mark_invalid("rice");
        sel.reset();

        assert_eq!(sel, ModifierSelection::new());
    }
}
