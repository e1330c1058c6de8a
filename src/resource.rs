/// Something that holds memory outside of Rust's ownership, typically on the GPU.
pub trait Release {
  fn release(&mut self);
}

/// Owns at most one live resource and releases it before a replacement is built.
pub struct ResourceSlot<R: Release> {
  current: Option<R>,
}

impl<R: Release> ResourceSlot<R> {
  pub fn new() -> Self {
    Self { current: None }
  }

  pub fn get(&self) -> Option<&R> {
    self.current.as_ref()
  }

  pub fn is_occupied(&self) -> bool {
    self.current.is_some()
  }

  /// Releases the current resource, then stores whatever `build` returns.
  /// If `build` panics the slot stays empty.
  pub fn replace<F>(&mut self, build: F) -> &R
  where
    F: FnOnce() -> R,
  {
    self.clear();
    self.current.insert(build())
  }

  /// Like [`ResourceSlot::replace`], but an `Err` from `build` leaves the slot empty.
  pub fn try_replace<F, E>(&mut self, build: F) -> Result<&R, E>
  where
    F: FnOnce() -> Result<R, E>,
  {
    self.clear();
    let next = build()?;
    Ok(self.current.insert(next))
  }

  pub fn clear(&mut self) {
    if let Some(mut old) = self.current.take() {
      old.release();
    }
  }
}

impl<R: Release> Default for ResourceSlot<R> {
  fn default() -> Self {
    Self::new()
  }
}

impl<R: Release> Drop for ResourceSlot<R> {
  fn drop(&mut self) {
    self.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::cell::Cell;
  use std::panic::{catch_unwind, AssertUnwindSafe};
  use std::rc::Rc;

  struct Tracked {
    live: Rc<Cell<usize>>,
    id: u32,
  }

  impl Tracked {
    fn new(live: &Rc<Cell<usize>>, id: u32) -> Self {
      live.set(live.get() + 1);
      Self { live: live.clone(), id }
    }
  }

  impl Release for Tracked {
    fn release(&mut self) {
      self.live.set(self.live.get() - 1);
    }
  }

  #[test]
  fn replacing_twice_leaves_one_live_resource() {
    let live = Rc::new(Cell::new(0));
    let mut slot = ResourceSlot::new();
    slot.replace(|| Tracked::new(&live, 1));
    slot.replace(|| Tracked::new(&live, 2));
    assert_eq!(live.get(), 1);
    assert_eq!(slot.get().map(|r| r.id), Some(2));
  }

  #[test]
  fn old_resource_is_released_before_the_new_one_is_built() {
    let live = Rc::new(Cell::new(0));
    let mut slot = ResourceSlot::new();
    slot.replace(|| Tracked::new(&live, 1));
    slot.replace(|| {
      assert_eq!(live.get(), 0);
      Tracked::new(&live, 2)
    });
  }

  #[test]
  fn failed_build_leaves_slot_empty() {
    let live = Rc::new(Cell::new(0));
    let mut slot = ResourceSlot::new();
    slot.replace(|| Tracked::new(&live, 1));
    let result: Result<&Tracked, &str> = slot.try_replace(|| Err("out of memory"));
    assert!(result.is_err());
    assert!(!slot.is_occupied());
    assert_eq!(live.get(), 0);
  }

  #[test]
  fn panicking_build_leaves_slot_empty() {
    let live = Rc::new(Cell::new(0));
    let mut slot = ResourceSlot::new();
    slot.replace(|| Tracked::new(&live, 1));
    let outcome = catch_unwind(AssertUnwindSafe(|| {
      slot.replace(|| panic!("allocation failed"));
    }));
    assert!(outcome.is_err());
    assert!(!slot.is_occupied());
    assert_eq!(live.get(), 0);
  }

  #[test]
  fn dropping_the_slot_releases_its_content() {
    let live = Rc::new(Cell::new(0));
    {
      let mut slot = ResourceSlot::new();
      slot.replace(|| Tracked::new(&live, 1));
      assert_eq!(live.get(), 1);
    }
    assert_eq!(live.get(), 0);
  }
}
