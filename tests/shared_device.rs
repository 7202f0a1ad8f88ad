use virtual_disk::{Device, DeviceError, SeekWhence, CAPACITY, PORT1_SET, PORT2_SET};

fn pattern(seed: u8) -> Vec<u8> {
    (0..CAPACITY).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}

#[test]
fn round_trip_over_the_whole_device() {
    let device = Device::new().unwrap();
    let data = pattern(1);

    let mut writer = device.open();
    assert_eq!(writer.write(&data), Ok(CAPACITY));
    writer.close();

    let mut reader = device.open();
    let mut buf = vec![0u8; CAPACITY];
    assert_eq!(reader.read(&mut buf), Ok(CAPACITY));
    assert_eq!(buf, data);
}

#[test]
fn writes_are_visible_to_other_sessions() {
    let device = Device::new().unwrap();
    let mut first = device.open();
    let mut second = device.open();
    assert_eq!(device.open_count(), 2);

    first.write(&pattern(9)).unwrap();

    let mut buf = vec![0u8; CAPACITY];
    assert_eq!(second.read(&mut buf), Ok(CAPACITY));
    assert_eq!(buf, pattern(9));

    // Positions stay per session.
    assert_eq!(first.position(), CAPACITY as u64);
    second.seek(7, SeekWhence::Start).unwrap();
    assert_eq!(first.position(), CAPACITY as u64);
}

#[test]
fn clear_from_one_session_is_seen_by_another() {
    let device = Device::new().unwrap();
    let mut writer = device.open();
    let reader = device.open();
    writer.write(&pattern(3)).unwrap();

    reader.control(virtual_disk::MEM_CLEAR, 0xdead).unwrap();

    writer.seek(0, SeekWhence::Start).unwrap();
    let mut buf = vec![0xFFu8; CAPACITY];
    assert_eq!(writer.read(&mut buf), Ok(CAPACITY));
    assert!(buf.iter().all(|byte| *byte == 0));
}

#[test]
fn registers_stay_zero() {
    let device = Device::new().unwrap();

    device.control(PORT1_SET, 42).unwrap();
    device.control(PORT2_SET, 42).unwrap();

    assert_eq!(device.control_a(), 0);
    assert_eq!(device.control_b(), 0);
    assert_eq!(device.control(0x99, 42), Err(DeviceError::InvalidArgument));
}

#[test]
fn concurrent_sessions_never_tear_a_transfer() {
    let device = Device::new().unwrap();

    std::thread::scope(|scope| {
        for seed in 0..4u8 {
            let device = &device;
            scope.spawn(move || {
                let mut handle = device.open();
                let data = vec![seed; CAPACITY];
                let mut buf = vec![0u8; CAPACITY];

                for _ in 0..200 {
                    handle.seek(0, SeekWhence::Start).unwrap();
                    assert_eq!(handle.write(&data), Ok(CAPACITY));

                    handle.seek(0, SeekWhence::Start).unwrap();
                    assert_eq!(handle.read(&mut buf), Ok(CAPACITY));
                    assert!(buf.iter().all(|byte| *byte == buf[0]));
                }
            });
        }
    });

    assert_eq!(device.open_count(), 0);
    let memory = device.snapshot();
    assert!(memory.iter().all(|byte| *byte == memory[0]));
}
