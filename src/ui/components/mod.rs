pub mod answer_sheet;
pub mod dashboard;
pub mod highlight_popup;
pub mod menu;
pub mod progress_bar;
pub mod text_pane;
