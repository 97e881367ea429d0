use super::*;

#[test]
fn groups_integer_digits() {
    assert_eq!(group_thousands(1234567.891, 2), "1,234,567.89");
    assert_eq!(group_thousands(999.0, 2), "999.00");
    assert_eq!(group_thousands(1000.0, 0), "1,000");
    assert_eq!(group_thousands(-45000.5, 2), "-45,000.50");
    assert_eq!(group_thousands(-0.001, 2), "0.00");
}
