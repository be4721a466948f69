//! Reading-aid highlights over passage and question text.
//!
//! Highlights are stored as char ranges over a region's plain text and never
//! touch the text itself; renderers ask for [`AnnotationSet::mask`] at draw
//! time.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::pointer::{Listener, PointerHub, Subscription};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegionId {
    Passage,
    Section(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextPoint {
    pub region: RegionId,
    pub offset: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextSelection {
    pub anchor: TextPoint,
    pub focus: TextPoint,
}

impl TextSelection {
    pub fn caret(point: TextPoint) -> Self {
        Self {
            anchor: point,
            focus: point,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.focus
    }

    /// Ordered `(start, end)` when both ends lie in the same region.
    pub fn span(&self) -> Option<(RegionId, usize, usize)> {
        if self.anchor.region != self.focus.region {
            return None;
        }
        let start = self.anchor.offset.min(self.focus.offset);
        let end = self.anchor.offset.max(self.focus.offset);
        Some((self.anchor.region, start, end))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Annotation {
    pub id: u64,
    pub region: RegionId,
    pub start: usize,
    pub end: usize,
}

impl Annotation {
    pub fn contains(&self, point: TextPoint) -> bool {
        self.region == point.region && point.offset >= self.start && point.offset < self.end
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenPos {
    pub column: u16,
    pub row: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Affordance {
    Create { selection: TextSelection, at: ScreenPos },
    Remove { annotation: u64, at: ScreenPos },
}

impl Affordance {
    pub fn label(&self) -> &'static str {
        match self {
            Affordance::Create { .. } => " Highlight ",
            Affordance::Remove { .. } => " Remove highlight ",
        }
    }

    /// `(column, row, width, height)` of the popup, one row below the pointer.
    pub fn bounds(&self) -> (u16, u16, u16, u16) {
        let at = match self {
            Affordance::Create { at, .. } | Affordance::Remove { at, .. } => *at,
        };
        let width = self.label().chars().count() as u16 + 2;
        (at.column, at.row.saturating_add(1), width, 3)
    }

    pub fn contains(&self, pos: ScreenPos) -> bool {
        let (x, y, w, h) = self.bounds();
        pos.column >= x && pos.column < x.saturating_add(w) && pos.row >= y && pos.row < y.saturating_add(h)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WrapError {
    #[error("selection is empty")]
    Empty,
    #[error("selection spans more than one region")]
    CrossesRegions,
    #[error("selection partially overlaps an existing highlight")]
    Overlaps,
    #[error("selection falls outside the region text")]
    OutOfBounds,
}

#[derive(Clone, Debug, Default)]
pub struct AnnotationSet {
    annotations: Vec<Annotation>,
    next_id: u64,
}

impl AnnotationSet {
    /// Highlight the selected span. A span that fully covers existing
    /// highlights absorbs them; a partial overlap cannot be wrapped.
    pub fn wrap(&mut self, selection: &TextSelection, region_len: usize) -> Result<u64, WrapError> {
        if selection.is_empty() {
            return Err(WrapError::Empty);
        }
        let (region, start, end) = selection.span().ok_or(WrapError::CrossesRegions)?;
        if start == end {
            return Err(WrapError::Empty);
        }
        if end > region_len {
            return Err(WrapError::OutOfBounds);
        }
        let partial = self.annotations.iter().any(|a| {
            a.region == region
                && a.start < end
                && start < a.end
                && !(start <= a.start && a.end <= end)
        });
        if partial {
            return Err(WrapError::Overlaps);
        }

        self.annotations
            .retain(|a| !(a.region == region && start <= a.start && a.end <= end));
        let id = self.next_id;
        self.next_id += 1;
        self.annotations.push(Annotation {
            id,
            region,
            start,
            end,
        });
        Ok(id)
    }

    pub fn remove(&mut self, id: u64) -> Option<Annotation> {
        let idx = self.annotations.iter().position(|a| a.id == id)?;
        Some(self.annotations.remove(idx))
    }

    pub fn containing(&self, point: TextPoint) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.contains(point))
    }

    pub fn in_region(&self, region: RegionId) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter().filter(move |a| a.region == region)
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn clear(&mut self) {
        self.annotations.clear();
    }

    /// Per-char highlight flags for a region of `len` chars.
    pub fn mask(&self, region: RegionId, len: usize) -> Vec<bool> {
        let mut mask = vec![false; len];
        for a in self.in_region(region) {
            let end = a.end.min(len);
            for flag in mask.iter_mut().take(end).skip(a.start) {
                *flag = true;
            }
        }
        mask
    }
}

/// Highlight state for the active test view, together with the pointer
/// listeners it needs. Dropping it detaches the listeners.
#[derive(Debug)]
pub struct Annotator {
    set: AnnotationSet,
    regions: BTreeMap<RegionId, usize>,
    pending: Option<TextSelection>,
    affordance: Option<Affordance>,
    _selection: Subscription,
    _dismiss: Subscription,
}

impl Annotator {
    pub fn attach(hub: &PointerHub, regions: impl IntoIterator<Item = (RegionId, usize)>) -> Self {
        Self {
            set: AnnotationSet::default(),
            regions: regions.into_iter().collect(),
            pending: None,
            affordance: None,
            _selection: hub.subscribe(Listener::Selection),
            _dismiss: hub.subscribe(Listener::Dismiss),
        }
    }

    pub fn annotations(&self) -> &AnnotationSet {
        &self.set
    }

    pub fn affordance(&self) -> Option<&Affordance> {
        self.affordance.as_ref()
    }

    /// Selection currently being dragged out, if any.
    pub fn pending(&self) -> Option<&TextSelection> {
        self.pending.as_ref()
    }

    /// Pointer press. Returns true when the press landed on the popup, in
    /// which case the popup action is applied. Any other press dismisses the
    /// popup and, inside a region, starts a new selection.
    pub fn press(&mut self, at: ScreenPos, point: Option<TextPoint>) -> bool {
        if let Some(affordance) = self.affordance
            && affordance.contains(at)
        {
            self.apply();
            return true;
        }
        self.affordance = None;
        self.pending = point.map(TextSelection::caret);
        false
    }

    pub fn extend(&mut self, point: TextPoint) {
        if let Some(sel) = self.pending.as_mut() {
            sel.focus = point;
        }
    }

    /// Pointer release: finish the pending selection and offer an action.
    pub fn release(&mut self, at: ScreenPos) -> Option<&Affordance> {
        let selection = self.pending.take();
        self.offer(selection, at)
    }

    /// Decide which popup a finished selection gets.
    pub fn offer(&mut self, selection: Option<TextSelection>, at: ScreenPos) -> Option<&Affordance> {
        let selection = selection.filter(|s| !s.is_empty())?;
        self.affordance = Some(match self.set.containing(selection.anchor) {
            Some(existing) => Affordance::Remove {
                annotation: existing.id,
                at,
            },
            None => Affordance::Create { selection, at },
        });
        self.affordance.as_ref()
    }

    /// Carry out the popup action. Wrap failures are dropped silently; the
    /// reader can select again.
    pub fn apply(&mut self) {
        match self.affordance.take() {
            Some(Affordance::Create { selection, .. }) => {
                let region_len = self.regions.get(&selection.anchor.region).copied().unwrap_or(0);
                if let Err(err) = self.set.wrap(&selection, region_len) {
                    tracing::debug!("highlight not created: {err}");
                }
            }
            Some(Affordance::Remove { annotation, .. }) => {
                self.set.remove(annotation);
            }
            None => {}
        }
    }

    pub fn dismiss(&mut self) {
        self.affordance = None;
        self.pending = None;
    }

    /// Stop listening and keep only the highlights, for read-only display.
    pub fn into_annotations(self) -> AnnotationSet {
        self.set
    }

    pub fn region_len(&self, region: RegionId) -> Option<usize> {
        self.regions.get(&region).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "Honeybees are managed livestock.";

    fn point(offset: usize) -> TextPoint {
        TextPoint {
            region: RegionId::Passage,
            offset,
        }
    }

    fn select(a: usize, b: usize) -> TextSelection {
        TextSelection {
            anchor: point(a),
            focus: point(b),
        }
    }

    #[test]
    fn test_create_then_remove_restores_plain_mask() {
        let mut set = AnnotationSet::default();
        let len = TEXT.chars().count();
        let id = set.wrap(&select(14, 21), len).unwrap();

        let mask = set.mask(RegionId::Passage, len);
        let marked: String = TEXT
            .chars()
            .zip(&mask)
            .filter(|&(_, &on)| on)
            .map(|(c, _)| c)
            .collect();
        assert_eq!(marked, "managed");
        assert!(set.mask(RegionId::Section(0), 10).iter().all(|&on| !on));

        set.remove(id).unwrap();
        assert_eq!(set.mask(RegionId::Passage, len), vec![false; len]);
    }

    #[test]
    fn test_backwards_selection_is_normalized() {
        let mut set = AnnotationSet::default();
        set.wrap(&select(21, 14), TEXT.chars().count()).unwrap();
        let a = set.in_region(RegionId::Passage).next().unwrap();
        assert_eq!((a.start, a.end), (14, 21));
    }

    #[test]
    fn test_cross_region_selection_fails() {
        let mut set = AnnotationSet::default();
        let sel = TextSelection {
            anchor: point(3),
            focus: TextPoint {
                region: RegionId::Section(0),
                offset: 2,
            },
        };
        assert_eq!(set.wrap(&sel, 100), Err(WrapError::CrossesRegions));
        assert!(set.is_empty());
    }

    #[test]
    fn test_partial_overlap_fails_and_full_cover_absorbs() {
        let mut set = AnnotationSet::default();
        set.wrap(&select(5, 10), 40).unwrap();
        assert_eq!(set.wrap(&select(8, 15), 40), Err(WrapError::Overlaps));
        set.wrap(&select(2, 20), 40).unwrap();
        assert_eq!(set.len(), 1);
        let a = set.in_region(RegionId::Passage).next().unwrap();
        assert_eq!((a.start, a.end), (2, 20));
    }

    #[test]
    fn test_out_of_bounds_fails() {
        let mut set = AnnotationSet::default();
        assert_eq!(set.wrap(&select(2, 50), 10), Err(WrapError::OutOfBounds));
    }

    #[test]
    fn test_mask_counts_chars_not_bytes() {
        let text = "café crème";
        let len = text.chars().count();
        let mut set = AnnotationSet::default();
        set.wrap(&select(3, 6), len).unwrap();
        let mask = set.mask(RegionId::Passage, len);
        assert_eq!(mask.len(), 10);
        assert_eq!(
            mask,
            vec![false, false, false, true, true, true, false, false, false, false]
        );
    }

    #[test]
    fn test_mask_of_empty_region_is_empty() {
        let mut set = AnnotationSet::default();
        set.wrap(&select(0, 3), 5).unwrap();
        assert!(set.mask(RegionId::Passage, 0).is_empty());
    }

    #[test]
    fn test_annotator_listeners_follow_lifetime() {
        let hub = PointerHub::new();
        let annotator = Annotator::attach(&hub, [(RegionId::Passage, 40)]);
        assert!(hub.is_listening(Listener::Selection));
        assert!(hub.is_listening(Listener::Dismiss));
        drop(annotator);
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn test_empty_selection_offers_nothing() {
        let hub = PointerHub::new();
        let mut annotator = Annotator::attach(&hub, [(RegionId::Passage, 40)]);
        let at = ScreenPos { column: 3, row: 3 };
        annotator.press(at, Some(point(4)));
        assert!(annotator.release(at).is_none());
        assert!(annotator.affordance().is_none());
    }

    #[test]
    fn test_selection_flow_creates_and_removes() {
        let hub = PointerHub::new();
        let mut annotator = Annotator::attach(&hub, [(RegionId::Passage, 40)]);
        let at = ScreenPos { column: 10, row: 2 };

        annotator.press(at, Some(point(4)));
        annotator.extend(point(9));
        let offered = annotator.release(at).copied();
        assert!(matches!(offered, Some(Affordance::Create { .. })));

        // Clicking the popup applies it.
        let (x, y, _, _) = offered.unwrap().bounds();
        assert!(annotator.press(ScreenPos { column: x + 1, row: y + 1 }, None));
        assert_eq!(annotator.annotations().len(), 1);

        // Selecting inside the highlight offers removal.
        annotator.press(at, Some(point(5)));
        annotator.extend(point(6));
        let offered = annotator.release(at).copied();
        assert!(matches!(offered, Some(Affordance::Remove { .. })));
        annotator.apply();
        assert!(annotator.annotations().is_empty());
    }

    #[test]
    fn test_press_outside_popup_dismisses() {
        let hub = PointerHub::new();
        let mut annotator = Annotator::attach(&hub, [(RegionId::Passage, 40)]);
        annotator.offer(Some(select(1, 4)), ScreenPos { column: 0, row: 0 });
        assert!(annotator.affordance().is_some());
        assert!(!annotator.press(ScreenPos { column: 60, row: 20 }, None));
        assert!(annotator.affordance().is_none());
    }

    #[test]
    fn test_failed_wrap_is_silent() {
        let hub = PointerHub::new();
        let mut annotator = Annotator::attach(&hub, [(RegionId::Passage, 40)]);
        let sel = TextSelection {
            anchor: point(1),
            focus: TextPoint {
                region: RegionId::Section(0),
                offset: 4,
            },
        };
        annotator.offer(Some(sel), ScreenPos { column: 0, row: 0 });
        annotator.apply();
        assert!(annotator.annotations().is_empty());
        assert!(annotator.affordance().is_none());
    }
}
