/// Small deterministic generator (mulberry32). Every maze and every engine owns
/// its own instance so runs can be replayed from a seed.
#[derive(Clone, Debug)]
pub struct Rng {
    seed: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    /// Seeds from the process RNG; used when the caller did not pin a seed.
    pub fn from_entropy() -> Self {
        Self::new(rand::random::<u32>())
    }

    pub fn next_u32(&mut self) -> u32 {
        self.seed = self.seed.wrapping_add(0x6d2b79f5);
        let mut t = self.seed;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    pub fn next_f32(&mut self) -> f32 {
        let out = self.next_u32();
        ((out as f64 / 4_294_967_296.0) as f32).min(0.999_999_9)
    }

    /// Inclusive on both ends.
    pub fn int(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f32;
        (min + (self.next_f32() * span).floor() as i32).min(max)
    }

    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    pub fn bool(&mut self, probability: f32) -> bool {
        self.next_f32() < probability
    }

    pub fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        (self.next_f32() * len as f32).floor().min((len - 1) as f32) as usize
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.pick_index(items.len()))
    }

    /// Fisher-Yates.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for idx in (1..items.len()).rev() {
            let other = self.pick_index(idx + 1);
            items.swap(idx, other);
        }
    }
}
