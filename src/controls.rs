//! Parameter panel.
//!
//! One slider per numeric field and a colour picker per gradient end. Values
//! change live while a widget is being dragged; an edit is committed, and a
//! [`ParameterChange`] queued, once the pointer is released and no picker
//! popup is open. Committed changes are what trigger a rebuild of the galaxy.

use crate::{Color, GalaxyParameters};
use egui::emath::Numeric;
use std::collections::VecDeque;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Control {
  Count,
  Size,
  Radius,
  Branches,
  Spin,
  Randomness,
  RandomnessPower,
  InsideColor,
  OutsideColor,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SliderRange {
  pub min: f64,
  pub max: f64,
  pub step: f64,
}

impl SliderRange {
  const fn new(min: f64, max: f64, step: f64) -> Self {
    Self { min, max, step }
  }

  pub fn clamp(&self, value: f64) -> f64 {
    value.clamp(self.min, self.max)
  }
}

impl Control {
  pub const ALL: [Control; 9] = [
    Control::Count,
    Control::Size,
    Control::Radius,
    Control::Branches,
    Control::Spin,
    Control::Randomness,
    Control::RandomnessPower,
    Control::InsideColor,
    Control::OutsideColor,
  ];

  pub fn label(self) -> &'static str {
    match self {
      Control::Count => "count",
      Control::Size => "size",
      Control::Radius => "radius",
      Control::Branches => "branches",
      Control::Spin => "spin",
      Control::Randomness => "randomness",
      Control::RandomnessPower => "randomness power",
      Control::InsideColor => "inside color",
      Control::OutsideColor => "outside color",
    }
  }

  /// Slider bounds, `None` for the colour pickers.
  pub fn range(self) -> Option<SliderRange> {
    match self {
      Control::Count => Some(SliderRange::new(100.0, 1_000_000.0, 100.0)),
      Control::Size => Some(SliderRange::new(0.001, 0.1, 0.001)),
      Control::Radius => Some(SliderRange::new(1.0, 20.0, 0.01)),
      Control::Branches => Some(SliderRange::new(2.0, 20.0, 1.0)),
      Control::Spin => Some(SliderRange::new(-5.0, 5.0, 0.001)),
      Control::Randomness => Some(SliderRange::new(0.0, 2.0, 0.001)),
      Control::RandomnessPower => Some(SliderRange::new(1.0, 10.0, 0.001)),
      Control::InsideColor | Control::OutsideColor => None,
    }
  }

  fn get(self, params: &GalaxyParameters) -> f64 {
    match self {
      Control::Count => f64::from(params.count),
      Control::Size => f64::from(params.size),
      Control::Radius => f64::from(params.radius),
      Control::Branches => f64::from(params.branches),
      Control::Spin => f64::from(params.spin),
      Control::Randomness => f64::from(params.randomness),
      Control::RandomnessPower => f64::from(params.randomness_power),
      Control::InsideColor | Control::OutsideColor => 0.0,
    }
  }

  fn set(self, params: &mut GalaxyParameters, value: f64) {
    match self {
      Control::Count => params.count = value.round() as u32,
      Control::Size => params.size = value as f32,
      Control::Radius => params.radius = value as f32,
      Control::Branches => params.branches = value.round() as u32,
      Control::Spin => params.spin = value as f32,
      Control::Randomness => params.randomness = value as f32,
      Control::RandomnessPower => params.randomness_power = value as f32,
      Control::InsideColor | Control::OutsideColor => {}
    }
  }

  pub fn display_value(self, params: &GalaxyParameters) -> String {
    match self {
      Control::Count => params.count.to_string(),
      Control::Branches => params.branches.to_string(),
      Control::InsideColor => params.inside_color.to_hex(),
      Control::OutsideColor => params.outside_color.to_hex(),
      _ => format!("{:.3}", self.get(params)),
    }
  }
}

/// Pulls every numeric field into its slider range and returns the ones that moved.
pub fn clamp_parameters(params: &mut GalaxyParameters) -> Vec<Control> {
  let mut clamped = Vec::new();
  for control in Control::ALL {
    if let Some(range) = control.range() {
      // compare in the field's own type, an f32 bound widened to f64 is not the f64 bound
      let mut candidate = *params;
      control.set(&mut candidate, range.clamp(control.get(params)));
      if candidate != *params {
        *params = candidate;
        clamped.push(control);
      }
    }
  }
  clamped
}

/// A committed edit. `control` is `None` when everything was reset.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ParameterChange {
  pub control: Option<Control>,
}

pub struct ParameterPanel {
  /// Edited this gesture, not yet committed.
  pending: Vec<Control>,
  changes: VecDeque<ParameterChange>,
}

impl ParameterPanel {
  pub fn init() -> Self {
    Self {
      pending: Vec::new(),
      changes: VecDeque::new(),
    }
  }

  pub fn show(&mut self, ctx: &egui::Context, params: &mut GalaxyParameters) {
    egui::Window::new("Galaxy")
      .anchor(egui::Align2::RIGHT_TOP, [-8.0, 8.0])
      .resizable(false)
      .show(ctx, |ui| {
        self.slider(ui, &mut params.count, Control::Count);
        self.slider(ui, &mut params.size, Control::Size);
        self.slider(ui, &mut params.radius, Control::Radius);
        self.slider(ui, &mut params.branches, Control::Branches);
        self.slider(ui, &mut params.spin, Control::Spin);
        self.slider(ui, &mut params.randomness, Control::Randomness);
        self.slider(ui, &mut params.randomness_power, Control::RandomnessPower);
        self.color(ui, &mut params.inside_color, Control::InsideColor);
        self.color(ui, &mut params.outside_color, Control::OutsideColor);
        ui.separator();
        if ui.button("Reset").clicked() {
          self.reset(params);
        }
      });

    let busy = ctx.input(|i| i.pointer.any_down()) || ctx.memory(|m| m.any_popup_open());
    self.finish_frame(busy, params);
  }

  fn slider<N: Numeric>(&mut self, ui: &mut egui::Ui, value: &mut N, control: Control) {
    let Some(range) = control.range() else {
      return;
    };
    let slider = egui::Slider::new(value, N::from_f64(range.min)..=N::from_f64(range.max))
      .step_by(range.step)
      .clamp_to_range(true)
      .text(control.label());
    if ui.add(slider).changed() {
      self.mark_edited(control);
    }
  }

  fn color(&mut self, ui: &mut egui::Ui, color: &mut Color, control: Control) {
    ui.horizontal(|ui| {
      // egui pickers edit linear rgb, same space as Color
      let mut rgb = color.to_array();
      if ui.color_edit_button_rgb(&mut rgb).changed() {
        *color = Color::new(rgb[0], rgb[1], rgb[2]);
        self.mark_edited(control);
      }
      ui.label(control.label());
    });
  }

  pub fn mark_edited(&mut self, control: Control) {
    if !self.pending.contains(&control) {
      self.pending.push(control);
    }
  }

  /// Commits pending edits unless a drag or picker is still in progress.
  pub fn finish_frame(&mut self, busy: bool, params: &GalaxyParameters) {
    if busy {
      return;
    }
    for control in self.pending.drain(..) {
      log::info!("{} = {}", control.label(), control.display_value(params));
      self.changes.push_back(ParameterChange {
        control: Some(control),
      });
    }
  }

  pub fn reset(&mut self, params: &mut GalaxyParameters) {
    self.pending.clear();
    *params = GalaxyParameters::default();
    self.changes.push_back(ParameterChange { control: None });
  }

  pub fn drain_changes(&mut self) -> Vec<ParameterChange> {
    self.changes.drain(..).collect()
  }
}

impl Default for ParameterPanel {
  fn default() -> Self {
    Self::init()
  }
}
