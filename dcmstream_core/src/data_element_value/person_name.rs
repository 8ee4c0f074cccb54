//! Work with the DICOM `PersonName` value representation.

use crate::DataError;

/// The five components of a single person name.
///
#[derive(Clone, Debug, PartialEq)]
pub struct PersonNameComponents {
  pub last_name: String,
  pub first_name: String,
  pub middle_name: String,
  pub prefix: String,
  pub suffix: String,
}

/// A structured person name that can be converted to/from a `PersonName`
/// value. A person name has three component groups: alphabetic, ideographic,
/// and phonetic. Each is optional, though usually only the alphabetic group is
/// present.
///
#[derive(Clone, Debug, PartialEq)]
pub struct StructuredPersonName {
  pub alphabetic: Option<PersonNameComponents>,
  pub ideographic: Option<PersonNameComponents>,
  pub phonetic: Option<PersonNameComponents>,
}

/// Converts a `PersonName` value into a list of structured person names.
///
pub fn from_bytes(
  bytes: &[u8],
) -> Result<Vec<StructuredPersonName>, DataError> {
  let person_name_string = core::str::from_utf8(bytes).map_err(|_| {
    DataError::new_value_invalid("PersonName is invalid UTF-8".to_string())
  })?;

  person_name_string
    .split('\\')
    .map(parse_person_name)
    .collect()
}

/// Parses a single person name by splitting on `=` into component groups and
/// then on `^` into the components of each group.
///
fn parse_person_name(
  person_name: &str,
) -> Result<StructuredPersonName, DataError> {
  let component_groups: Vec<&str> = person_name.split('=').collect();

  if component_groups.len() > 3 {
    return Err(DataError::new_value_invalid(format!(
      "PersonName has too many component groups: {}",
      component_groups.len()
    )));
  }

  let mut component_groups = component_groups
    .iter()
    .map(|group| parse_component_group(group))
    .collect::<Result<Vec<Option<PersonNameComponents>>, _>>()?;

  component_groups.resize(3, None);

  Ok(StructuredPersonName {
    alphabetic: component_groups[0].clone(),
    ideographic: component_groups[1].clone(),
    phonetic: component_groups[2].clone(),
  })
}

fn parse_component_group(
  component_group: &str,
) -> Result<Option<PersonNameComponents>, DataError> {
  let mut components: Vec<&str> = component_group
    .split('^')
    .map(|s| s.trim_end_matches(' '))
    .collect();

  if components.len() > 5 {
    return Err(DataError::new_value_invalid(format!(
      "PersonName has too many components: {}",
      components.len()
    )));
  }

  // A component group where every component is empty isn't returned at all
  if components.iter().all(|c| c.is_empty()) {
    return Ok(None);
  }

  components.resize(5, "");

  Ok(Some(PersonNameComponents {
    last_name: components[0].to_string(),
    first_name: components[1].to_string(),
    middle_name: components[2].to_string(),
    prefix: components[3].to_string(),
    suffix: components[4].to_string(),
  }))
}

/// Converts a list of structured person names into a `PersonName` value.
///
pub fn to_bytes(
  person_names: &[StructuredPersonName],
) -> Result<Vec<u8>, DataError> {
  let names = person_names
    .iter()
    .map(|name| {
      let component_groups =
        [&name.alphabetic, &name.ideographic, &name.phonetic]
          .iter()
          .map(|group| match group {
            Some(components) => component_group_to_string(components),
            None => Ok("".to_string()),
          })
          .collect::<Result<Vec<String>, DataError>>()?;

      Ok(
        component_groups
          .join("=")
          .trim_end_matches('=')
          .to_string(),
      )
    })
    .collect::<Result<Vec<String>, DataError>>()?;

  let mut bytes = names.join("\\").into_bytes();

  if bytes.len() % 2 == 1 {
    bytes.push(0x20);
  }

  Ok(bytes)
}

fn component_group_to_string(
  components: &PersonNameComponents,
) -> Result<String, DataError> {
  let components: [&str; 5] = [
    components.last_name.trim_end_matches(' '),
    components.first_name.trim_end_matches(' '),
    components.middle_name.trim_end_matches(' '),
    components.prefix.trim_end_matches(' '),
    components.suffix.trim_end_matches(' '),
  ];

  for component in components {
    if component.len() > 64 {
      return Err(DataError::new_value_invalid(
        "PersonName component is too long".to_string(),
      ));
    }

    if component.contains(['^', '=', '\\']) {
      return Err(DataError::new_value_invalid(
        "PersonName component has disallowed characters".to_string(),
      ));
    }
  }

  Ok(components.join("^").trim_end_matches('^').to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn components(
    last: &str,
    first: &str,
    middle: &str,
    prefix: &str,
    suffix: &str,
  ) -> PersonNameComponents {
    PersonNameComponents {
      last_name: last.to_string(),
      first_name: first.to_string(),
      middle_name: middle.to_string(),
      prefix: prefix.to_string(),
      suffix: suffix.to_string(),
    }
  }

  #[test]
  fn from_bytes_test() {
    assert_eq!(
      from_bytes(&[]),
      Ok(vec![StructuredPersonName {
        alphabetic: None,
        ideographic: None,
        phonetic: None
      }])
    );

    assert_eq!(
      from_bytes(b"A^B^^^"),
      Ok(vec![StructuredPersonName {
        alphabetic: Some(components("A", "B", "", "", "")),
        ideographic: None,
        phonetic: None
      }])
    );

    assert_eq!(
      from_bytes(b"A^B^C^D^E=1^2^3^4^5=v^w^x^y^z"),
      Ok(vec![StructuredPersonName {
        alphabetic: Some(components("A", "B", "C", "D", "E")),
        ideographic: Some(components("1", "2", "3", "4", "5")),
        phonetic: Some(components("v", "w", "x", "y", "z"))
      }])
    );

    assert_eq!(
      from_bytes(&[0xD0]),
      Err(DataError::new_value_invalid(
        "PersonName is invalid UTF-8".to_string()
      ))
    );

    assert_eq!(
      from_bytes(b"A=B=C=D"),
      Err(DataError::new_value_invalid(
        "PersonName has too many component groups: 4".to_string()
      ))
    );

    assert_eq!(
      from_bytes(b"A^B^C^D^E^F"),
      Err(DataError::new_value_invalid(
        "PersonName has too many components: 6".to_string()
      ))
    );
  }

  #[test]
  fn to_bytes_test() {
    assert_eq!(
      to_bytes(&[StructuredPersonName {
        alphabetic: Some(components("A", "B", "C", "D", "E")),
        ideographic: Some(components("1", "2", "3", "4", "5")),
        phonetic: Some(components("v", "w", "x", "y", "z")),
      }]),
      Ok(b"A^B^C^D^E=1^2^3^4^5=v^w^x^y^z ".to_vec())
    );

    assert_eq!(
      to_bytes(&[StructuredPersonName {
        alphabetic: None,
        ideographic: Some(components("A", "B", "C", "", "E")),
        phonetic: None,
      }]),
      Ok(b"=A^B^C^^E ".to_vec())
    );

    assert_eq!(
      to_bytes(&[StructuredPersonName {
        alphabetic: Some(components("^", "B", "C", "", "E")),
        ideographic: None,
        phonetic: None,
      }]),
      Err(DataError::new_value_invalid(
        "PersonName component has disallowed characters".to_string()
      ))
    );

    assert_eq!(
      to_bytes(&[StructuredPersonName {
        alphabetic: Some(components(&"A".repeat(65), "", "", "", "E")),
        ideographic: None,
        phonetic: None,
      }]),
      Err(DataError::new_value_invalid(
        "PersonName component is too long".to_string()
      ))
    );
  }
}
