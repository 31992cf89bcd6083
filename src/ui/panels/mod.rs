pub mod input_panel;
pub mod result_panel;

pub use input_panel::InputPanel;
pub use result_panel::ResultPanel;
