//! Enumeration of all assignments of tasks to instances.

/// Returns the number of assignments of `len` tasks to `base` instances, or `None` if it doesn't fit into `u64`.
pub fn search_space_size(base: usize, len: usize) -> Option<u64> {
    let len = u32::try_from(len).ok()?;
    (base as u64).checked_pow(len)
}

/// Counter over all digit vectors of length `len` with digits in `1..=base`.
///
/// Each digit vector describes one assignment: digit `i` is the 1-based index of the instance running task `i`.
/// The counter starts from all ones and advances like an odometer: the least significant (last) digit is
/// incremented, and a digit which passes `base` wraps back to 1 and carries into the digit on its left. The counter
/// is exhausted when the carry escapes the most significant digit, so every assignment is produced exactly once, in
/// lexicographic order.
#[derive(Clone, Debug)]
pub struct Odometer {
    digits: Vec<usize>,
    base: usize,
    exhausted: bool,
}

impl Odometer {
    pub fn new(base: usize, len: usize) -> Self {
        Self {
            digits: vec![1; len],
            base,
            exhausted: base == 0 && len > 0,
        }
    }

    /// Creates counter positioned at the assignment with the specified index in enumeration order.
    pub fn starting_at(base: usize, len: usize, index: u64) -> Self {
        let mut odometer = Self::new(base, len);
        if odometer.exhausted {
            return odometer;
        }
        match search_space_size(base, len) {
            Some(size) if index < size => {
                let mut rest = index;
                for digit in odometer.digits.iter_mut().rev() {
                    *digit = (rest % base as u64) as usize + 1;
                    rest /= base as u64;
                }
            }
            _ => odometer.exhausted = true,
        }
        odometer
    }

    /// Returns the current assignment.
    pub fn digits(&self) -> &[usize] {
        &self.digits
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Moves to the next assignment. Returns `false` if the current assignment was the last one.
    pub fn advance(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        let mut target = self.digits.len();
        loop {
            if target == 0 {
                // carry escaped the most significant digit
                self.exhausted = true;
                return false;
            }
            target -= 1;
            if self.digits[target] < self.base {
                break;
            }
        }
        self.digits[target] += 1;
        for digit in self.digits[target + 1..].iter_mut() {
            *digit = 1;
        }
        true
    }
}

impl Iterator for Odometer {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let current = self.digits.clone();
        self.advance();
        Some(current)
    }
}
