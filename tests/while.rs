#[macro_use]
mod common;

#[cfg(test)]
mod _while {
    tests! {
        syntax in while is OK
        "0"
        "1"
        "2"
    }

    tests! {
        closure_in_body in while is OK
        "0"
    }
}
