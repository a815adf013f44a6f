use crate::harbor::{VehicleId, NORMAL_BOOTHS, BOOTHS_PER_PORT};
use parking_lot::{Condvar, Mutex};
use rand::Rng;

/// Check-in point of a port. Serves one vehicle at a time and keeps no other
/// state; the vehicle keeps it until it gets into a waiting line.
#[derive(Debug)]
pub struct Booth {
    pub id: usize,
    occupant: Mutex<Option<VehicleId>>,
    vacated: Condvar,
}

/// Proof of holding a booth. The booth is freed when the pass is dropped.
#[derive(Debug)]
pub struct BoothPass<'a> {
    booth: &'a Booth,
}

impl Booth {
    pub fn new(id: usize) -> Booth {
        Booth {
            id,
            occupant: Mutex::new(None),
            vacated: Condvar::new(),
        }
    }

    /// Blocks until the booth is free and takes it.
    pub fn occupy(&self, vehicle: VehicleId) -> BoothPass<'_> {
        let mut occupant = self.occupant.lock();

        while occupant.is_some() {
            self.vacated.wait(&mut occupant);
        }

        *occupant = Some(vehicle);

        BoothPass { booth: self }
    }

}

impl<'a> BoothPass<'a> {
    pub fn booth(&self) -> &'a Booth {
        self.booth
    }
}

impl Drop for BoothPass<'_> {
    fn drop(&mut self) {
        *self.booth.occupant.lock() = None;
        self.booth.vacated.notify_one();
    }
}

/// Uniform over the normal booths; special passengers may also use the last one.
pub fn pick<R: Rng>(rng: &mut R, special: bool) -> usize {
    let booths = if special { BOOTHS_PER_PORT } else { NORMAL_BOOTHS };

    rng.gen_range(0..booths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    impl Booth {
        fn occupant(&self) -> Option<VehicleId> {
            *self.occupant.lock()
        }
    }

    #[test]
    fn normal_passengers_never_use_the_special_booth() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        assert!((0..1000).all(|_| pick(&mut rng, false) < NORMAL_BOOTHS));
        assert!((0..1000).any(|_| pick(&mut rng, true) == NORMAL_BOOTHS));
    }

    #[test]
    fn pass_releases_booth_on_drop() {
        let booth = Booth::new(2);

        {
            let pass = booth.occupy(7);
            assert_eq!(pass.booth().id, 2);
            assert_eq!(booth.occupant(), Some(7));
        }

        assert_eq!(booth.occupant(), None);
    }

    #[test]
    fn second_vehicle_waits_for_the_first() {
        let booth = Arc::new(Booth::new(0));
        let served = Arc::new(AtomicBool::new(false));

        let pass = booth.occupy(1);

        let waiter = {
            let booth = Arc::clone(&booth);
            let served = Arc::clone(&served);

            thread::spawn(move || {
                let _pass = booth.occupy(2);
                served.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(20));
        assert!(!served.load(Ordering::SeqCst));

        drop(pass);
        waiter.join().unwrap();

        assert!(served.load(Ordering::SeqCst));
    }
}
