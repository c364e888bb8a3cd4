// Lock-free communication channels

use crate::event::TimedDeviceEvent;
use crate::messaging::notification::Notification;
use ringbuf::{HeapRb, traits::Split};

pub type EventProducer = ringbuf::HeapProd<TimedDeviceEvent>;
pub type EventConsumer = ringbuf::HeapCons<TimedDeviceEvent>;

/// Channel carrying decoded device events from the device layer to the engine
pub fn create_event_channel(capacity: usize) -> (EventProducer, EventConsumer) {
    let rb = HeapRb::<TimedDeviceEvent>::new(capacity);
    rb.split()
}

pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

/// Channel carrying warnings from the engine to the UI
pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<Notification>::new(capacity);
    rb.split()
}
