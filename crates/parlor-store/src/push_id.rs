//! Time-ordered message keys.
//!
//! 20 characters: 8 encode the millisecond timestamp, 12 are random. The
//! alphabet is in ASCII order, so comparing two ids as strings compares their
//! creation order. Keys made within the same millisecond, or after the clock
//! stepped back, reuse the previous timestamp and bump the random part.

use chrono::Utc;
use rand::Rng;

use parlor_types::models::MessageId;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

const TIME_CHARS: usize = 8;
const RANDOM_CHARS: usize = 12;

pub struct PushIdGenerator {
    last_millis: i64,
    last_random: [u8; RANDOM_CHARS],
}

impl Default for PushIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PushIdGenerator {
    pub fn new() -> Self {
        Self {
            last_millis: i64::MIN,
            last_random: [0; RANDOM_CHARS],
        }
    }

    pub fn next_id(&mut self) -> MessageId {
        self.next_at(Utc::now().timestamp_millis())
    }

    pub fn next_at(&mut self, now_millis: i64) -> MessageId {
        let millis = now_millis.max(self.last_millis);

        if millis == self.last_millis {
            for slot in self.last_random.iter_mut().rev() {
                if *slot == 63 {
                    *slot = 0;
                } else {
                    *slot += 1;
                    break;
                }
            }
        } else {
            let mut rng = rand::rng();
            for slot in self.last_random.iter_mut() {
                *slot = rng.random_range(0..64);
            }
        }
        self.last_millis = millis;

        let mut time_chars = [0u8; TIME_CHARS];
        let mut remaining = millis.max(0) as u64;
        for c in time_chars.iter_mut().rev() {
            *c = PUSH_CHARS[(remaining % 64) as usize];
            remaining /= 64;
        }

        let mut id = String::with_capacity(TIME_CHARS + RANDOM_CHARS);
        id.extend(time_chars.iter().map(|&c| c as char));
        id.extend(self.last_random.iter().map(|&i| PUSH_CHARS[i as usize] as char));
        MessageId::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphabet_is_sorted() {
        assert!(PUSH_CHARS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_ids_increase_within_one_millisecond() {
        let mut ids = PushIdGenerator::new();
        let mut prev = ids.next_at(1_700_000_000_000);
        assert_eq!(prev.as_str().len(), 20);

        for _ in 0..1000 {
            let next = ids.next_at(1_700_000_000_000);
            assert!(next > prev, "{} !> {}", next, prev);
            prev = next;
        }
    }

    #[test]
    fn test_ids_follow_time_and_survive_clock_skew() {
        let mut ids = PushIdGenerator::new();
        let a = ids.next_at(1_000);
        let b = ids.next_at(2_000);
        let c = ids.next_at(1_500);
        assert!(a < b);
        assert!(b < c);
        assert_eq!(&b.as_str()[..8], &c.as_str()[..8]);
    }
}
