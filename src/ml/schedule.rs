/// Step decay: the rate used in epoch `e` (0-based) is
/// `base · gamma^(e / step)`. A zero step keeps the rate constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepLr {
    base:  f64,
    step:  usize,
    gamma: f64,
}

impl StepLr {
    pub fn new(base: f64, step: usize, gamma: f64) -> Self {
        Self { base, step, gamma }
    }

    pub fn lr_at(&self, epoch: usize) -> f64 {
        if self.step == 0 {
            return self.base;
        }
        let decays = (epoch / self.step) as i32;
        self.base * self.gamma.powi(decays)
    }
}
