#[macro_use]
mod common;

#[cfg(test)]
mod class {
    tests! {
        empty in class is OK
        "Foo"
    }

    tests! {
        local_reference_self in class is OK
        "Foo"
    }

    tests! {
        inherited_method in class is OK
        "foo"
        "bar"
    }

    tests! {
        inherit_self in class is ERR
        "[line 1] Error at 'A': A class can't inherit from itself."
    }

    tests! {
        superclass_not_class in class is ERR
        "Superclass must be a class."
        "[line 3]"
    }
}
