/// egui rendering: sidebar, top bar, metric cards, narrative and the trend plot.
pub mod panels;
pub mod plot;
