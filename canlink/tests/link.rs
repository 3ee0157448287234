mod common;

use std::boxed::Box;
use std::thread;

use canlink::controller::{Event, RxSlot};
use canlink::frame::Frame;
use canlink::{Bitrate, Delivery, DeliveryQueue, Error, IdType, Link, SharedLink};
use common::{Call, SimController, config, frame};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

type SingleLink = Link<SimController, 1>;

fn ready_link() -> SingleLink {
    let mut link = Link::new([SimController::busy_bus(Bitrate::Kbps500)], config()).unwrap();
    link.init_port(0, Bitrate::Unknown).unwrap();
    link
}

#[test]
fn test_init_defaults_to_500k() {
    let link = ready_link();
    let port = link.port(0).unwrap();

    assert_eq!(port.bitrate(), Bitrate::Kbps500);
    assert_eq!(port.bit_timing(), Bitrate::Kbps500.timing());
    assert_eq!(port.controller().armed, Some(RxSlot::A));
}

#[test]
fn test_init_failure() {
    let mut sim = SimController::new();
    sim.rejected.push(Bitrate::Kbps250.timing());
    let mut link: SingleLink = Link::new([sim], config()).unwrap();

    assert_eq!(link.init_port(0, Bitrate::Kbps250), Err(Error::HardwareInit));
    assert_eq!(link.port(0).unwrap().bitrate(), Bitrate::Unknown);
    assert_eq!(link.init_port(1, Bitrate::Kbps250), Err(Error::InvalidArgument));
}

#[test]
fn test_set_bitrate() {
    let mut link = ready_link();

    assert_eq!(link.set_bitrate(0, Bitrate::Unknown), Err(Error::InvalidArgument));
    assert_eq!(link.set_bitrate(0, Bitrate::Kbps250), Ok(()));

    let port = link.port(0).unwrap();
    assert_eq!(port.bitrate(), Bitrate::Kbps250);
    assert_eq!(
        port.controller().calls.last(),
        Some(&Call::SetBitTiming(Bitrate::Kbps250.timing()))
    );
}

#[test]
fn test_receive_swap() {
    let mut link = ready_link();
    let first = frame(0x100, &[1]);
    let second = frame(0x200, &[2]);

    let delivery = link.handle_event(0, Event::RxComplete(first)).unwrap();
    assert_eq!(delivery, Delivery::Received { instance: 0, frame: first });
    let port = link.port(0).unwrap();
    assert_eq!(port.controller().armed, Some(RxSlot::B));
    assert_eq!(port.rx_slots().active(), RxSlot::B);
    assert_eq!(port.rx_slots().get(RxSlot::A), &first);

    let delivery = link.handle_event(0, Event::RxComplete(second)).unwrap();
    assert_eq!(delivery, Delivery::Received { instance: 0, frame: second });
    let port = link.port(0).unwrap();
    assert_eq!(port.controller().armed, Some(RxSlot::A));
    assert_eq!(port.rx_slots().get(RxSlot::B), &second);
    // The previous frame is still readable until the slot is filled again
    assert_eq!(port.rx_slots().get(RxSlot::A), &first);

    assert!(link.activity().take_rx());
}

#[test]
fn test_taken_frame_is_never_armed() {
    let mut link = ready_link();
    for id in 0..10 {
        let delivery = link.handle_event(0, Event::RxComplete(frame(id, &[]))).unwrap();
        let Delivery::Received { frame: taken, .. } = delivery else {
            panic!("unexpected delivery {delivery:?}");
        };
        let slots = link.port(0).unwrap().rx_slots();
        assert_eq!(slots.get(slots.ready()), &taken);
        assert_eq!(link.port(0).unwrap().controller().armed, Some(slots.active()));
    }
}

#[test]
fn test_transmit_complete_event() {
    let mut link = ready_link();

    assert_eq!(
        link.handle_event(0, Event::TxComplete),
        Ok(Delivery::TransmitComplete { instance: 0 })
    );
    assert!(link.activity().take_tx());
    assert_eq!(
        link.handle_event(3, Event::TxComplete),
        Err(Error::InvalidArgument)
    );
}

#[test]
fn test_filter_programming() {
    let mut link = ready_link();

    assert_eq!(link.insert_filter_id(0x750), Ok(0));
    assert_eq!(link.insert_filter_id(0x123), Ok(0));
    assert_eq!(link.insert_filter_id(0x7FF), Ok(2));
    assert_eq!(link.lookup_filter_id(0x750), Some(1));

    link.apply_filter(0).unwrap();

    let mut expected = vec![0x7FF; 48];
    expected[..3].copy_from_slice(&[0x123, 0x750, 0x7FF]);
    let calls = &link.port(0).unwrap().controller().calls;
    assert_eq!(
        calls[calls.len() - 2..],
        [
            Call::Mask(IdType::Extended, 0x1FFF_FFFF),
            Call::Filter(IdType::Standard, expected),
        ]
    );
}

#[test]
fn test_init_clears_filter_table() {
    let mut link = ready_link();
    link.insert_filter_id(0x10).unwrap();

    link.reinit_port(0, Bitrate::Kbps500).unwrap();
    assert_eq!(link.filter_table().ids(), &[0x10]);

    link.init_port(0, Bitrate::Kbps500).unwrap();
    assert!(link.filter_table().is_empty());
    assert_eq!(link.lookup_filter_id(0x10), None);
}

#[test]
fn test_open_filter() {
    let mut link = ready_link();
    link.open_filter(0).unwrap();
    assert_eq!(
        link.port(0).unwrap().controller().calls.last(),
        Some(&Call::Mask(IdType::Extended, 0))
    );
}

#[test]
fn test_delivery_queue_overflow() {
    let queue = DeliveryQueue::<CriticalSectionRawMutex, 2>::new();

    assert!(queue.push(Delivery::TransmitComplete { instance: 0 }).is_ok());
    assert!(queue.push(Delivery::TransmitComplete { instance: 1 }).is_ok());
    assert_eq!(
        queue.push(Delivery::TransmitComplete { instance: 2 }),
        Err(Delivery::TransmitComplete { instance: 2 })
    );
    assert_eq!(queue.dropped(), 1);

    let mut seen = Vec::new();
    assert_eq!(queue.drain(|delivery| seen.push(delivery.instance())), 2);
    assert_eq!(seen, [0, 1]);
    assert!(queue.is_empty());
}

#[test]
fn test_shared_link() {
    let link = SharedLink::<CriticalSectionRawMutex, _, 1>::new(ready_link());
    let link: &'static _ = Box::leak(Box::new(link));
    let queue: &'static _ = Box::leak(Box::new(DeliveryQueue::<CriticalSectionRawMutex, 64>::new()));

    let interrupt = thread::spawn(move || {
        for id in 0..32 {
            link.on_interrupt_queued(0, Event::RxComplete(frame(id, &[])), queue)
                .unwrap();
        }
    });
    for id in 0..32 {
        link.lock(|link| link.insert_filter_id(0x400 + id)).unwrap();
    }
    interrupt.join().unwrap();

    let mut ids = Vec::new();
    queue.drain(|delivery| {
        if let Delivery::Received { frame, .. } = delivery {
            ids.push(frame.id);
        }
    });
    assert_eq!(ids, (0..32).collect::<Vec<_>>());
    assert_eq!(link.lock(|link| link.filter_table().len()), 32);
    assert_eq!(
        link.on_interrupt(0, Event::TxComplete),
        Ok(Delivery::TransmitComplete { instance: 0 })
    );
}

#[test]
fn test_take_message_alternates_slots() {
    let mut link = ready_link();
    let first = frame(0x100, &[1]);
    link.handle_event(0, Event::RxComplete(first)).unwrap();

    let port = link.port_mut(0).unwrap();
    assert_eq!(port.rx_slots().active(), RxSlot::B);

    // Slot B was active and never filled
    assert_eq!(port.take_message(), Frame::empty());
    assert_eq!(port.rx_slots().active(), RxSlot::A);
    assert_eq!(port.controller().armed, Some(RxSlot::A));

    assert_eq!(port.take_message(), first);
    assert_eq!(port.rx_slots().active(), RxSlot::B);
    assert_eq!(port.controller().armed, Some(RxSlot::B));
}

#[test]
fn test_queued_interrupt_overflow() {
    let link = SharedLink::<CriticalSectionRawMutex, _, 1>::new(ready_link());
    let queue = DeliveryQueue::<CriticalSectionRawMutex, 1>::new();

    assert_eq!(link.on_interrupt_queued(0, Event::RxComplete(frame(0x1, &[])), &queue), Ok(()));
    assert_eq!(link.on_interrupt_queued(0, Event::RxComplete(frame(0x2, &[])), &queue), Ok(()));
    assert_eq!(queue.dropped(), 1);
    assert_eq!(queue.len(), 1);

    // The slot swap happened for the dropped delivery as well
    let link = link.into_inner();
    assert_eq!(link.port(0).unwrap().rx_slots().active(), RxSlot::A);
}
