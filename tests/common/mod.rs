use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

/// A `Write` sink that hands its bytes to a shared buffer, so a test can read back what a `Lox`
/// instance printed after the instance itself has gone out of scope.
pub struct SharedBuffer(pub Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[macro_export]
macro_rules! tests {
    ($file:ident in $scope:ident is OK $($expected:expr)*) => {
        #[test]
        fn $file() {
            use loxrs::Lox;
            use std::cell::RefCell;
            use std::rc::Rc;
            use $crate::common::SharedBuffer;

            let mut expected = vec![$($expected),*];
            let expected = match expected.len() {
                0 => "".to_string(),
                _ => {
                    expected.push("");
                    expected.join("\n")
                }
            };

            let buffer = Rc::new(RefCell::new(Vec::new()));
            let mut lox = Lox::new(SharedBuffer(Rc::clone(&buffer)));

            lox.run_file(&format!("tests/fixtures/{}/{}.lox", stringify!($scope), stringify!($file)));
            assert!(!lox.had_error());

            assert_eq!(expected, std::str::from_utf8(&buffer.borrow()).unwrap());
        }
    };

    ($file:ident in $scope:ident is ERR $($expected:expr)+) => {
        #[test]
        fn $file() {
            use assert_cmd::Command;

            let output = vec![$($expected),+].join("\n");
            let file = format!("tests/fixtures/{}/{}.lox", stringify!($scope), stringify!($file));

            Command::cargo_bin("loxrs").unwrap()
                .arg(file)
                .assert()
                .stderr(format!("{output}\n"))
                .failure();
        }
    };
}
