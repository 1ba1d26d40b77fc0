/// ORACLE SIMULATOR TESTS
///
/// These tests verify:
/// - Every configured oracle registers and pays its fee into escrow
/// - A delayed-flight request reaches quorum and credits passengers
/// - The event-driven loop answers requests and honours shutdown

#[cfg(test)]
mod simulator_tests {
    use flightsurety_core::*;
    use flightsurety_oracle_sim::*;
    use std::time::Duration;
    use tokio::sync::watch;
    use tokio_test::assert_ok;

    fn account(n: u32) -> Address {
        Address::derive("account", n)
    }

    /// Every oracle draws indexes 1, 2, 3 and every fetch lands on index 1.
    fn scripted_system() -> SharedFlightSurety {
        FlightSurety::with_entropy(
            account(0),
            account(1),
            ProtocolConfig::default(),
            Box::new(SequenceEntropy::new(vec![1, 2, 3])),
        )
        .unwrap()
        .into_shared()
    }

    fn insured_flight(system: &SharedFlightSurety) -> FlightKey {
        let mut fs = system.lock();
        fs.fund_account(account(1), 10 * UNIT).unwrap();
        fs.buy_insurance(account(50), account(1), "ND1309", 1_600_000_000, UNIT)
            .unwrap();
        FlightKey::new(account(1), "ND1309", 1_600_000_000)
    }

    #[test]
    fn test_register_all_escrows_fees() {
        let system = scripted_system();
        let mut sim = OracleSimulator::new(
            system.clone(),
            SimulatorConfig::default(),
            FixedStatusPicker(STATUS_CODE_ON_TIME),
        );

        assert_eq!(sim.register_all().unwrap(), 30);
        assert!(sim.oracles().iter().all(|o| o.indexes == vec![1, 2, 3]));
        assert_eq!(system.lock().escrow_balance().unwrap(), 30 * UNIT);
    }

    #[test]
    fn test_delayed_quorum_credits_passenger() {
        let system = scripted_system();
        let flight = insured_flight(&system);
        let mut sim = OracleSimulator::new(
            system.clone(),
            SimulatorConfig::default(),
            FixedStatusPicker(STATUS_CODE_LATE_AIRLINE),
        );
        sim.register_all().unwrap();

        let index = system
            .lock()
            .fetch_flight_status(account(0), flight.airline, &flight.flight, flight.timestamp)
            .unwrap();
        assert_eq!(index, 1);

        let submissions = sim.handle_request(index, &flight);
        assert_eq!(submissions.len(), 30);
        assert!(submissions.iter().all(|s| s.result.is_ok()));
        let finalized = submissions
            .iter()
            .filter(|s| matches!(s.result, Ok(ResponseOutcome { finalized: Some(_), .. })))
            .count();
        assert_eq!(finalized, 1);

        let fs = system.lock();
        assert_eq!(fs.flight_status(&flight), Some(STATUS_CODE_LATE_AIRLINE));
        assert_eq!(fs.pending_credit(&account(50)).unwrap(), UNIT * 3 / 2);
    }

    #[test]
    fn test_second_pass_reports_duplicates() {
        let system = scripted_system();
        let flight = insured_flight(&system);
        let mut sim = OracleSimulator::new(
            system.clone(),
            SimulatorConfig::default(),
            FixedStatusPicker(STATUS_CODE_ON_TIME),
        );
        sim.register_all().unwrap();
        system.lock().request_status(2, flight.clone()).unwrap();

        sim.handle_request(2, &flight);
        let again = sim.handle_request(2, &flight);
        assert!(again
            .iter()
            .all(|s| s.result == Err(FlightSuretyError::DuplicateResponse)));
        assert_eq!(system.lock().pending_credit(&account(50)).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_run_loop_answers_requests() {
        let system = scripted_system();
        let flight = insured_flight(&system);
        let mut sim = OracleSimulator::new(
            system.clone(),
            SimulatorConfig::default(),
            FixedStatusPicker(STATUS_CODE_LATE_AIRLINE),
        );
        sim.register_all().unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(sim.run(shutdown_rx));
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        system
            .lock()
            .fetch_flight_status(account(0), flight.airline, &flight.flight, flight.timestamp)
            .unwrap();

        let mut status = None;
        for _ in 0..100 {
            status = system.lock().flight_status(&flight);
            if status.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(status, Some(STATUS_CODE_LATE_AIRLINE));

        shutdown_tx.send(true).unwrap();
        let stopped = assert_ok!(handle.await);
        assert_ok!(stopped);
    }
}
