use rand::Rng;

/// Upper- and lower-case ASCII letters plus digits.
pub const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Random short code source.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    alphabet: &'static [u8],
    length: usize,
}

impl CodeGenerator {
    pub fn new(alphabet: &'static [u8], length: usize) -> Self {
        Self { alphabet, length }
    }

    /// Draw `length` symbols uniformly from the alphabet.
    pub fn random_code<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        (0..self.length)
            .map(|_| self.alphabet[rng.gen_range(0..self.alphabet.len())] as char)
            .collect()
    }

    /// Resample until `is_taken` reports a free code.
    ///
    /// Does not return if every code of this length is taken.
    pub fn unused_code(&self, is_taken: impl Fn(&str) -> bool) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let code = self.random_code(&mut rng);
            if !is_taken(&code) {
                return code;
            }
        }
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new(ALPHANUMERIC, DEFAULT_CODE_LENGTH)
    }
}
