#[macro_use]
mod common;

#[cfg(test)]
mod inheritance {
    tests! {
        inherit_methods in inheritance is OK
        "A foo"
        "B bar"
        "B baz"
    }

    tests! {
        constructor in inheritance is OK
        "1"
    }
}
