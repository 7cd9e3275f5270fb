//! Verification of index lists, valid and otherwise

use equihash::{Equihash, EquihashBuilder, Error, Header, RuntimeOption, VerifyError};

const SAMPLE_HEADER: &str = concat!(
    "04000000e54c27544050668f272ec3b460e1cde745c6b21239a81dae637fde47040000",
    "00844bc0c55696ef9920eeda11c1eb41b0c2e7324b46cc2e7aa0c2aa7736448d7a0000",
    "00000000000000000000000000000000000000000000000000000000000068241a587e",
    "7e061d250e000000000000010000000000000000000000000000000000000000000000",
);

fn header_with(byte: u8) -> Header {
    let mut bytes = *SAMPLE_HEADER.parse::<Header>().unwrap().as_bytes();
    bytes[108] = byte;
    Header::from_bytes(&bytes).unwrap()
}

fn verifier(n: u32, k: u32) -> Equihash {
    EquihashBuilder::new()
        .params(n, k)
        .runtime(RuntimeOption::Sequential)
        .build()
        .unwrap()
}

fn verify_error(result: Result<(), Error>) -> VerifyError {
    match result {
        Err(Error::Verify(err)) => err,
        other => panic!("expected a verification error, got {other:?}"),
    }
}

#[test]
fn known_solutions() {
    let verifier = verifier(48, 3);
    let header: Header = SAMPLE_HEADER.parse().unwrap();
    verifier
        .verify(&header, &[1042, 3396, 2575, 3109, 1643, 6733, 6871, 8138])
        .unwrap();
    verifier
        .verify(&header, &[1784, 2986, 4929, 4983, 1989, 7038, 5276, 7363])
        .unwrap();
    equihash::verify(
        SAMPLE_HEADER,
        48,
        3,
        &[1042, 3396, 2575, 3109, 1643, 6733, 6871, 8138],
    )
    .unwrap();

    // Valid for its own nonce only
    assert!(matches!(
        verify_error(verifier.verify(
            &header_with(0),
            &[1042, 3396, 2575, 3109, 1643, 6733, 6871, 8138]
        )),
        VerifyError::Collision { .. }
    ));
}

#[test]
fn structural_checks() {
    let verifier = verifier(24, 2);
    let header = header_with(1);
    verifier.verify(&header, &[93, 293, 166, 493]).unwrap();

    assert_eq!(
        verify_error(verifier.verify(&header, &[93, 293, 166])),
        VerifyError::WrongLength {
            expected: 4,
            actual: 3
        }
    );
    assert_eq!(
        verify_error(verifier.verify(&header, &[93, 293, 166, 4096])),
        VerifyError::IndexOutOfRange(4096)
    );
    // Swapping sibling subtrees breaks the canonical order
    assert_eq!(
        verify_error(verifier.verify(&header, &[166, 493, 93, 293])),
        VerifyError::OutOfOrder
    );
    assert_eq!(
        verify_error(verifier.verify(&header, &[293, 93, 166, 493])),
        VerifyError::OutOfOrder
    );
    assert_eq!(
        verify_error(verifier.verify(&header, &[93, 293, 166, 293])),
        VerifyError::DuplicateIndices
    );
}

#[test]
fn collision_checks() {
    let verifier = verifier(24, 2);
    let header = header_with(1);
    // One leaf replaced: the first merge no longer collides
    assert_eq!(
        verify_error(verifier.verify(&header, &[93, 294, 166, 493])),
        VerifyError::Collision { round: 0 }
    );
    // Both pairs collide on window 0 but not with each other on window 1
    assert_eq!(
        verify_error(verifier.verify(&header, &[0, 13, 1, 3])),
        VerifyError::Collision { round: 1 }
    );
    // Windows 0 and 1 collide, the remaining bits don't
    assert_eq!(
        verify_error(verifier.verify(&header, &[0, 13, 35, 159])),
        VerifyError::NonZeroRoot
    );
}

#[test]
fn header_errors_come_first() {
    assert!(matches!(
        equihash::verify("00", 24, 2, &[93, 293, 166, 493]),
        Err(Error::Format(_))
    ));
    assert!(matches!(
        equihash::verify(SAMPLE_HEADER, 24, 4, &[93, 293, 166, 493]),
        Err(Error::Parameter(_))
    ));
}
