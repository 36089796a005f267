//! Fixed-size worker pool over independent work items.
//!
//! Items are fed through a bounded queue; each worker returns its own result
//! on a channel and the calling thread merges them as they complete. No
//! accumulator is shared with the workers. Results come back in input order.

use std::sync::Mutex;
use std::sync::mpsc;
use std::thread;

/// Run `work` over `items` on `workers` threads.
///
/// `on_complete` runs on the calling thread once per item, in completion
/// order, with the item's input index.
pub fn map_parallel<T, R, F, C>(items: Vec<T>, workers: usize, work: F, mut on_complete: C) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync,
    C: FnMut(usize, &R),
{
    let total = items.len();
    if total == 0 {
        return Vec::new();
    }
    let workers = workers.clamp(1, total);

    let (job_tx, job_rx) = mpsc::sync_channel::<(usize, T)>(workers * 2);
    let job_rx = Mutex::new(job_rx);
    let (result_tx, result_rx) = mpsc::channel::<(usize, R)>();
    let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(total).collect();

    thread::scope(|scope| {
        scope.spawn(move || {
            for job in items.into_iter().enumerate() {
                if job_tx.send(job).is_err() {
                    break;
                }
            }
        });

        let job_rx = &job_rx;
        let work = &work;
        for _ in 0..workers {
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                loop {
                    let next = match job_rx.lock() {
                        Ok(rx) => rx.recv(),
                        Err(_) => break,
                    };
                    let Ok((index, item)) = next else {
                        break;
                    };
                    if result_tx.send((index, work(item))).is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        for (index, result) in result_rx {
            on_complete(index, &result);
            slots[index] = Some(result);
        }
    });

    slots.into_iter().flatten().collect()
}
